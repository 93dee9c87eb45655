use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("SSH error: {0}")]
    SshError(#[from] ssh2::Error),

    #[error("Unknown platform tag: {0}")]
    UnknownPlatform(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Authentication failed for {host}: {message}")]
    AuthenticationFailed { host: String, message: String },

    #[error("Connection refused by {host}")]
    ConnectionRefused { host: String },

    #[error("Host {host} unreachable: {message}")]
    UnreachableHost { host: String, message: String },

    #[error("Connection error: failed to connect to {addr}: {source}")]
    ConnectionFailed {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Timeout occurred while {action}")]
    Timeout { action: String },

    #[error("Command timed out: {command}")]
    CommandTimedOut { command: String },

    #[error("Driver error on {host}: {message}")]
    DriverError { host: String, message: String },

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("Prompt error: {0}")]
    PromptError(String),

    #[error("Parse produced no rows for {platform} command {command}")]
    ParseEmpty { platform: String, command: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("NetBox authentication rejected: {0}")]
    NetBoxAuth(String),

    #[error("NetBox API error ({status}): {message}")]
    NetBoxApi { status: u16, message: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Operation error: {0}")]
    OperationError(String),
}

// Helper methods for error context and retry categorisation
impl FleetError {
    pub fn connection_failed(addr: impl Into<String>, err: io::Error) -> Self {
        Self::ConnectionFailed {
            addr: addr.into(),
            source: err,
        }
    }

    pub fn auth_failed(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            host: host.into(),
            message: message.into(),
        }
    }

    pub fn driver(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DriverError {
            host: host.into(),
            message: message.into(),
        }
    }

    pub fn timeout(action: impl Into<String>) -> Self {
        Self::Timeout {
            action: action.into(),
        }
    }

    /// Transient transport failures that the retry helper may replay.
    /// Authentication failures are deliberately excluded.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::CommandTimedOut { .. }
            | Self::ConnectionRefused { .. }
            | Self::ConnectionFailed { .. }
            | Self::UnreachableHost { .. }
            | Self::DriverError { .. } => true,
            Self::NetBoxApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::NetBoxAuth(_)
        )
    }

    /// Configuration errors abort the run before any work starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_)
                | Self::TemplateError(_)
                | Self::UnknownPlatform(_)
                | Self::NetBoxAuth(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_not_retryable() {
        let err = FleetError::auth_failed("10.0.0.1", "bad password");
        assert!(!err.is_retryable());
        assert!(err.is_auth());
    }

    #[test]
    fn transport_failures_are_retryable() {
        assert!(FleetError::timeout("reading channel").is_retryable());
        assert!(FleetError::ConnectionRefused {
            host: "10.0.0.1".into()
        }
        .is_retryable());
    }

    #[test]
    fn netbox_backpressure_is_retryable() {
        let throttled = FleetError::NetBoxApi {
            status: 429,
            message: "slow down".into(),
        };
        let missing = FleetError::NetBoxApi {
            status: 404,
            message: "no such device".into(),
        };
        assert!(throttled.is_retryable());
        assert!(!missing.is_retryable());
    }

    #[test]
    fn config_errors_are_fatal() {
        assert!(FleetError::UnknownPlatform("frobozz_os".into()).is_fatal());
        assert!(FleetError::TemplateError("bad capture".into()).is_fatal());
        assert!(!FleetError::Cancelled.is_fatal());
    }
}
