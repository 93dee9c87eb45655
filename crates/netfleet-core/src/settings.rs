use std::time::Duration;

/// Tunable settings for the collector side of a run
///
/// All timeout values default to conservative numbers that work against slow
/// management planes; override through the builder for lab environments.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// TCP + SSH handshake timeout (default: 30s)
    pub connect_timeout: Duration,

    /// Read timeout for channel operations (default: 10s)
    pub read_timeout: Duration,

    /// Write timeout for channel operations (default: 10s)
    pub write_timeout: Duration,

    /// Maximum time to wait for a full command response (default: 30s)
    pub command_timeout: Duration,

    /// Maximum time to wait for a prompt pattern match (default: 20s)
    pub pattern_timeout: Duration,

    /// Number of retries for retryable connection failures (default: 3)
    pub retry_count: u32,

    /// Base delay between retries; grows exponentially with jitter (default: 1s)
    pub retry_delay: Duration,

    /// Upper bound for the backoff delay (default: 30s)
    pub retry_delay_cap: Duration,

    /// Maximum number of devices worked on concurrently (default: 10)
    pub max_concurrent_devices: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(30),
            pattern_timeout: Duration::from_secs(20),
            retry_count: 3,
            retry_delay: Duration::from_millis(1000),
            retry_delay_cap: Duration::from_secs(30),
            max_concurrent_devices: 10,
        }
    }
}

impl CollectorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CollectorSettingsBuilder {
        CollectorSettingsBuilder::default()
    }
}

/// Builder for CollectorSettings to allow fluent configuration
#[derive(Default)]
pub struct CollectorSettingsBuilder {
    settings: CollectorSettings,
}

impl CollectorSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.settings.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.settings.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.settings.write_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.settings.command_timeout = timeout;
        self
    }

    pub fn pattern_timeout(mut self, timeout: Duration) -> Self {
        self.settings.pattern_timeout = timeout;
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.settings.retry_count = count;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.settings.retry_delay = delay;
        self
    }

    pub fn retry_delay_cap(mut self, cap: Duration) -> Self {
        self.settings.retry_delay_cap = cap;
        self
    }

    pub fn max_concurrent_devices(mut self, max: usize) -> Self {
        self.settings.max_concurrent_devices = max;
        self
    }

    pub fn build(self) -> CollectorSettings {
        self.settings
    }
}

/// Connection settings for the NetBox REST endpoint
#[derive(Clone)]
pub struct NetBoxSettings {
    /// Base URL, e.g. "https://netbox.example.net"
    pub url: String,

    /// API token; never logged
    pub token: String,

    /// Page size for list endpoints (default: 500)
    pub page_limit: usize,

    /// Retries for 429/5xx responses (default: 3)
    pub retry_count: u32,

    /// Base backoff delay for throttled requests (default: 2s)
    pub retry_delay: Duration,

    /// Per-request timeout (default: 30s)
    pub request_timeout: Duration,
}

impl NetBoxSettings {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            page_limit: 500,
            retry_count: 3,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
        }
    }
}

// The token must never leak through Debug formatting in log lines.
impl std::fmt::Debug for NetBoxSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetBoxSettings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let settings = CollectorSettings::builder()
            .retry_count(5)
            .max_concurrent_devices(2)
            .command_timeout(Duration::from_secs(5))
            .build();
        assert_eq!(settings.retry_count, 5);
        assert_eq!(settings.max_concurrent_devices, 2);
        assert_eq!(settings.command_timeout, Duration::from_secs(5));
        // untouched fields keep defaults
        assert_eq!(settings.retry_delay, Duration::from_millis(1000));
    }

    #[test]
    fn debug_output_hides_token() {
        let nb = NetBoxSettings::new("https://netbox.local", "s3cr3t");
        let shown = format!("{:?}", nb);
        assert!(!shown.contains("s3cr3t"));
        assert!(shown.contains("netbox.local"));
    }
}
