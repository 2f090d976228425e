mod config;
mod error;
mod log_level;
mod logging_config;
mod paths_config;
mod server_config;
mod timing_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use paths_config::PathsConfig;
pub use server_config::ServerConfig;
pub use timing_config::TimingConfig;

const APP_DIR_NAME: &str = "nitro";
const CONFIG_FILENAME: &str = "supervisor.toml";
const CONFIG_DIR_ENV: &str = "NITRO_CONFIG_DIR";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3928;
const DEFAULT_BINARY_DIR_NAME: &str = "nitro";
const DEFAULT_SERVER_CONFIG_FILE: &str = "config/config.json";

const DEFAULT_PORT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_PORT_GRACE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_READINESS_POLL_INTERVAL_MS: u64 = 300;
const DEFAULT_READINESS_TIMEOUT_MS: u64 = 30_000;

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "logs";

const MIN_PORT: u16 = 1024;
