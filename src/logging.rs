use crate::config::LoggingConfig;
use crate::error::Result;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes console logging and, when configured, a JSON file log.
///
/// Keep the returned guard alive for the whole run so buffered file lines are flushed.
/// Fails before installing anything when the log folder cannot be created.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // Respect RUST_LOG if set; otherwise use the configured filter
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Human-readable, timestamped lines on stdout
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let (file_layer, guard) = match &config.file_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "data_cleaning.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}
