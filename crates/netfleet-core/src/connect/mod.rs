mod retry;
mod session;

pub use retry::backoff_delay;
pub use session::SshSession;

use crate::error::FleetError;
use crate::model::{Credentials, Device};
use crate::platform::PlatformRegistry;
use crate::settings::CollectorSettings;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens, drives and tears down SSH sessions with the run's retry policy.
///
/// Holds no cross-device state; every device gets exactly one session at a
/// time, owned by the worker that opened it.
pub struct ConnectionManager {
    settings: Arc<CollectorSettings>,
}

impl ConnectionManager {
    pub fn new(settings: Arc<CollectorSettings>) -> Self {
        Self { settings }
    }

    /// Open a session, retrying retryable transport failures with jittered
    /// backoff. Authentication failures are never retried.
    pub fn open(
        &self,
        device: &Device,
        credentials: &Credentials,
        registry: &PlatformRegistry,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SshSession, FleetError> {
        device.validate()?;
        let entry = registry.resolve(&device.platform)?;

        let mut attempt = 0u32;
        loop {
            match SshSession::open(
                &device.host,
                22,
                &credentials.username,
                &credentials.password,
                credentials.enable.as_deref(),
                entry.driver,
                &self.settings,
                cancel.clone(),
            ) {
                Ok(session) => {
                    debug!(host = %device.host, attempt, "session established");
                    return Ok(session);
                }
                Err(err) if err.is_retryable() && attempt < self.settings.retry_count => {
                    let delay = backoff_delay(
                        attempt,
                        self.settings.retry_delay,
                        self.settings.retry_delay_cap,
                    );
                    warn!(
                        host = %device.host,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "connect failed, retrying"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Issue one command with the configured per-command deadline
    pub fn run(&self, session: &mut SshSession, command: &str) -> Result<String, FleetError> {
        session.run(command, self.settings.command_timeout)
    }

    /// Tear the session down; best-effort by design
    pub fn close(&self, session: SshSession) {
        session.close();
    }
}
