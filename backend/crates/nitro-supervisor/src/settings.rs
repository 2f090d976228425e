use nitro_config::{Config, ConfigErrorResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved runtime settings for a [`crate::Supervisor`].
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub host: String,
    pub port: u16,
    pub binary_dir: PathBuf,
    pub config_path: PathBuf,
    pub user_data_dir: PathBuf,
    pub binary_name: Option<String>,
    pub port_poll_interval: Duration,
    pub port_grace_timeout: Duration,
    pub readiness_poll_interval: Duration,
    pub readiness_timeout: Duration,
    pub kill_on_readiness_timeout: bool,
}

impl SupervisorSettings {
    /// Default timings and port, explicit directories.
    pub fn new(binary_dir: &Path, user_data_dir: &Path) -> Self {
        let defaults = Config::default();

        Self::build(
            &defaults,
            binary_dir.to_path_buf(),
            binary_dir.join(&defaults.server.config_file),
            user_data_dir.to_path_buf(),
        )
    }

    /// Resolve directories from a loaded config.
    pub fn from_config(config: &Config) -> ConfigErrorResult<Self> {
        Ok(Self::build(
            config,
            config.binary_dir()?,
            config.server_config_path()?,
            config.user_data_dir()?,
        ))
    }

    fn build(
        config: &Config,
        binary_dir: PathBuf,
        config_path: PathBuf,
        user_data_dir: PathBuf,
    ) -> Self {
        let timing = &config.timing;

        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            binary_dir,
            config_path,
            user_data_dir,
            binary_name: config.server.binary_name.clone(),
            port_poll_interval: Duration::from_millis(timing.port_poll_interval_ms),
            port_grace_timeout: Duration::from_millis(timing.port_grace_timeout_ms),
            readiness_poll_interval: Duration::from_millis(timing.readiness_poll_interval_ms),
            readiness_timeout: Duration::from_millis(timing.readiness_timeout_ms),
            kill_on_readiness_timeout: timing.kill_on_readiness_timeout,
        }
    }
}
