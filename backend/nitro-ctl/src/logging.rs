//! Logging setup with file rotation.

use nitro_config::LoggingConfig;

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "nitro-ctl";
const MAX_LOG_FILES: usize = 7;

/// Setup logging with console and rotating file output.
///
/// # Log Layers
/// - Console: human-readable, on stderr so stdout stays JSON
/// - File: daily rotation under `<config_dir>/<logging.dir>`, 7 files kept
///
/// `RUST_LOG` takes precedence over the configured level.
pub(crate) fn setup_logging(
    config_dir: &Path,
    logging: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let logs_dir = config_dir.join(&logging.dir);
    std::fs::create_dir_all(&logs_dir)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&logs_dir)?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(logging)));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Filter used when `RUST_LOG` is unset.
pub(crate) fn default_directives(logging: &LoggingConfig) -> String {
    logging.level.to_string()
}
