use crate::error::FleetError;
use crate::platform::SshDriver;
use crate::settings::CollectorSettings;
use lazy_static::lazy_static;
use regex::Regex;
use ssh2::{Channel, Session};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

lazy_static! {
    // Device CLI prompts end in >, #, % or $ possibly followed by a space
    static ref PROMPT_PATTERN: Regex = Regex::new(r"[>#%\$]\s*$").unwrap();
    static ref PASSWORD_OR_PROMPT_PATTERN: Regex =
        Regex::new(r"(?i)(password\s*:\s*|[>#%\$]\s*)$").unwrap();
    static ref ANSI_ESCAPE_PATTERN: Regex = Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap();
}

/// One live SSH session to one device.
///
/// Commands are strictly sequential over the single shell channel; the
/// collector never interleaves commands on one session.
pub struct SshSession {
    host: String,
    session: Session,
    channel: Channel,
    driver: SshDriver,
    prompt: String,
    privileged: bool,
    read_timeout: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl SshSession {
    /// Establish the transport, authenticate, start a shell, discover the
    /// prompt and pin paging off. Each failure maps to a typed error so the
    /// retry policy can tell transient from fatal.
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        enable_secret: Option<&str>,
        driver: SshDriver,
        settings: &CollectorSettings,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Self, FleetError> {
        let addr_string = format!("{}:{}", host, port);
        debug!(host, port, "establishing TCP connection");

        let addr = addr_string
            .to_socket_addrs()
            .map_err(|e| FleetError::UnreachableHost {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .next()
            .ok_or_else(|| FleetError::UnreachableHost {
                host: host.to_string(),
                message: "no address resolved".to_string(),
            })?;

        let tcp = TcpStream::connect_timeout(&addr, settings.connect_timeout).map_err(|e| {
            match e.kind() {
                ErrorKind::ConnectionRefused => FleetError::ConnectionRefused {
                    host: host.to_string(),
                },
                ErrorKind::TimedOut | ErrorKind::WouldBlock => {
                    FleetError::timeout(format!("connecting to {}", addr_string))
                }
                _ => FleetError::connection_failed(addr_string.clone(), e),
            }
        })?;
        tcp.set_read_timeout(Some(settings.read_timeout))?;
        tcp.set_write_timeout(Some(settings.write_timeout))?;

        debug!(host, "starting SSH handshake");
        let mut session = Session::new().map_err(|e| FleetError::driver(host, e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| FleetError::driver(host, format!("handshake failed: {}", e)))?;

        debug!(host, username, "authenticating");
        session.userauth_password(username, password).map_err(|e| {
            FleetError::auth_failed(host, format!("password auth for {}: {}", username, e))
        })?;

        let mut channel = session
            .channel_session()
            .map_err(|e| FleetError::driver(host, format!("channel open failed: {}", e)))?;
        channel
            .request_pty("xterm", None, None)
            .map_err(|e| FleetError::driver(host, format!("pty request failed: {}", e)))?;
        channel
            .shell()
            .map_err(|e| FleetError::driver(host, format!("shell start failed: {}", e)))?;

        session.set_keepalive(true, 60);
        session.set_blocking(true);
        // Bound every blocking libssh2 call so a dead peer cannot hang a worker
        session.set_timeout(settings.read_timeout.as_millis() as u32);

        let mut ssh = Self {
            host: host.to_string(),
            session,
            channel,
            driver,
            prompt: String::new(),
            privileged: false,
            read_timeout: settings.read_timeout,
            cancel,
        };

        ssh.discover_prompt(settings.pattern_timeout)?;
        if !ssh.privileged {
            if let Some(secret) = enable_secret {
                ssh.enter_enable_mode(secret, settings.pattern_timeout)?;
            }
        }
        ssh.disable_paging(settings.pattern_timeout)?;
        Ok(ssh)
    }

    /// Hostname as the device presents it in its prompt
    pub fn prompt_hostname(&self) -> &str {
        &self.prompt
    }

    /// Issue one command and collect output until the prompt returns or the
    /// deadline fires.
    pub fn run(&mut self, command: &str, deadline: Duration) -> Result<String, FleetError> {
        self.drain_pending();

        trace!(host = %self.host, command, "sending command");
        self.write_line(command)?;

        let raw = self.read_until_prompt(deadline).map_err(|err| match err {
            FleetError::Timeout { .. } => FleetError::CommandTimedOut {
                command: command.to_string(),
            },
            other => other,
        })?;

        Ok(self.clean_output(&raw, command))
    }

    /// Always releases the transport, including on error paths.
    pub fn close(mut self) {
        let _ = self.channel.send_eof();
        let _ = self.channel.close();
        let _ = self
            .session
            .disconnect(None, "collection finished", None);
        debug!(host = %self.host, "session closed");
    }

    fn discover_prompt(&mut self, deadline: Duration) -> Result<(), FleetError> {
        self.write_line("")?;
        let output = self.read_until_prompt(deadline)?;
        let last = output
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| FleetError::PromptError("no prompt received".to_string()))?;
        let trimmed = last.trim();
        self.privileged = trimmed.ends_with('#');
        let prompt = trimmed
            .trim_end_matches(['>', '#', '%', '$', ' '])
            .to_string();
        if prompt.is_empty() {
            return Err(FleetError::PromptError(
                "prompt could not be determined".to_string(),
            ));
        }
        debug!(host = %self.host, prompt, privileged = self.privileged, "prompt discovered");
        self.prompt = prompt;
        Ok(())
    }

    /// Escalate from user exec to privileged mode with the enable secret
    fn enter_enable_mode(&mut self, secret: &str, deadline: Duration) -> Result<(), FleetError> {
        debug!(host = %self.host, "entering enable mode");
        self.write_line("enable")?;
        let output = self.read_until(&PASSWORD_OR_PROMPT_PATTERN, deadline)?;
        if output.to_lowercase().contains("password") {
            self.write_line(secret)?;
            let confirm = self.read_until_prompt(deadline)?;
            let denied = confirm.to_lowercase();
            if denied.contains("denied") || denied.contains("bad secret") {
                return Err(FleetError::auth_failed(
                    &self.host,
                    "enable secret rejected",
                ));
            }
        }
        self.privileged = true;
        Ok(())
    }

    /// Pinning paging off at session start keeps every later read loop
    /// simple: output ends at the prompt, never at a --More-- pause.
    fn disable_paging(&mut self, deadline: Duration) -> Result<(), FleetError> {
        let command = self.driver.no_pager_command();
        debug!(host = %self.host, command, "disabling paging");
        self.write_line(command)?;
        self.read_until_prompt(deadline)?;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), FleetError> {
        self.channel
            .write_all(format!("{}\n", line).as_bytes())
            .map_err(|e| FleetError::driver(&self.host, format!("write failed: {}", e)))?;
        self.channel
            .flush()
            .map_err(|e| FleetError::driver(&self.host, format!("flush failed: {}", e)))?;
        Ok(())
    }

    fn read_until_prompt(&mut self, deadline: Duration) -> Result<String, FleetError> {
        self.read_until(&PROMPT_PATTERN, deadline)
    }

    fn read_until(&mut self, pattern: &Regex, deadline: Duration) -> Result<String, FleetError> {
        let started = Instant::now();
        let mut collected = String::new();
        let mut buf = [0u8; 65536];

        loop {
            if let Some(cancel) = &self.cancel {
                if cancel.load(Ordering::SeqCst) {
                    return Err(FleetError::Cancelled);
                }
            }
            if started.elapsed() > deadline {
                return Err(FleetError::timeout(format!(
                    "waiting for prompt on {}",
                    self.host
                )));
            }

            match self.channel.read(&mut buf) {
                Ok(0) => {
                    return Err(FleetError::driver(&self.host, "channel closed".to_string()));
                }
                Ok(n) => {
                    collected.push_str(&String::from_utf8_lossy(&buf[..n]));
                    if let Some(last) = collected.lines().last() {
                        let stripped = ANSI_ESCAPE_PATTERN.replace_all(last, "");
                        if pattern.is_match(stripped.trim_end()) {
                            return Ok(collected);
                        }
                    }
                }
                Err(e)
                    if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
                {
                    // Per-read timeout elapsed without data; the outer
                    // deadline decides when to give up
                    continue;
                }
                Err(e) => {
                    return Err(FleetError::driver(
                        &self.host,
                        format!("read failed: {}", e),
                    ));
                }
            }
        }
    }

    /// Discard anything buffered from a previous exchange without blocking
    fn drain_pending(&mut self) {
        self.session.set_blocking(false);
        let mut buf = [0u8; 4096];
        while matches!(self.channel.read(&mut buf), Ok(n) if n > 0) {}
        self.session.set_blocking(true);
        self.session.set_timeout(self.read_timeout.as_millis() as u32);
    }

    /// Strip ANSI codes, the command echo and the trailing prompt line
    fn clean_output(&self, raw: &str, command: &str) -> String {
        let cleaned = ANSI_ESCAPE_PATTERN.replace_all(raw, "");
        let cleaned = cleaned.replace("\r\n", "\n").replace('\r', "");

        let mut lines: Vec<&str> = cleaned.lines().collect();
        if let Some(first) = lines.first() {
            if first.trim().ends_with(command.trim()) {
                lines.remove(0);
            }
        }
        while let Some(last) = lines.last() {
            let trimmed = last.trim();
            if trimmed.is_empty()
                || (trimmed.starts_with(&self.prompt) && PROMPT_PATTERN.is_match(trimmed))
            {
                lines.pop();
            } else {
                break;
            }
        }
        lines.join("\n")
    }
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.host)
            .field("prompt", &self.prompt)
            .field("driver", &self.driver)
            .finish()
    }
}
