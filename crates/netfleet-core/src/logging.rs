use crate::error::FleetError;
use chrono::Local;
use std::fs::create_dir_all;
use std::io;
use std::path::Path;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::FormatTime},
    prelude::*,
    EnvFilter, Layer,
};

struct CustomTime;

impl FormatTime for CustomTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Initialize the tracing system for logging
///
/// # Arguments
///
/// * `level` - The log level to use ("error", "warn", "info", "debug", "trace")
/// * `log_to_file` - Whether to log to a file
/// * `log_file_path` - Path to the log file (only used if log_to_file is true)
///
/// # Returns
///
/// Result indicating success or failure
pub fn init_logging(
    level: &str,
    log_to_file: bool,
    log_file_path: Option<&str>,
) -> Result<(), FleetError> {
    let filter_level = match level.to_lowercase().as_str() {
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    // RUST_LOG wins over the configured level
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(env_val) => EnvFilter::new(env_val),
        Err(_) => EnvFilter::new(level.to_lowercase()),
    };

    if log_to_file {
        let log_path = match log_file_path {
            Some(path) => path.to_string(),
            None => "logs/netfleet.log".to_string(),
        };

        let dir = Path::new(&log_path).parent().unwrap_or(Path::new(""));
        create_dir_all(dir).map_err(FleetError::IoError)?;

        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(FleetError::IoError)?;

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_timer(CustomTime)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter_level);

        let stdout_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_timer(CustomTime)
            .with_target(true)
            .with_filter(filter_level);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stdout_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stdout)
                    .with_ansi(true)
                    .with_timer(CustomTime)
                    .with_target(true)
                    .with_filter(filter_level),
            )
            .init();
    }

    tracing::info!("Logging initialized at {} level", level.to_uppercase());

    Ok(())
}
