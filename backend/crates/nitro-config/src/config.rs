use crate::{
    APP_DIR_NAME, CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult,
    DEFAULT_BINARY_DIR_NAME, LogLevel, LoggingConfig, PathsConfig, ServerConfig, TimingConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the config directory.
    ///
    /// Loading order:
    /// 1. NITRO_CONFIG_DIR env var, else `<platform config dir>/nitro`
    /// 2. Auto-create the config directory if it doesn't exist
    /// 3. Load supervisor.toml if it exists, else use defaults
    /// 4. Apply NITRO_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load from an explicit config directory.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: NITRO_CONFIG_DIR env var > `<platform config dir>/nitro`
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoPlatformDir { kind: "config" })
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.timing.validate()?;

        if let Some(ref dir) = self.paths.user_data_dir
            && !Path::new(dir).is_absolute()
        {
            return Err(ConfigError::paths(format!(
                "paths.user_data_dir must be absolute, got {dir}"
            )));
        }

        if let Some(ref dir) = self.server.binary_dir
            && !Path::new(dir).is_absolute()
        {
            return Err(ConfigError::paths(format!(
                "server.binary_dir must be absolute, got {dir}"
            )));
        }

        Ok(())
    }

    /// Directory holding the server binaries.
    ///
    /// Defaults to a `nitro` directory next to the running executable.
    pub fn binary_dir(&self) -> ConfigErrorResult<PathBuf> {
        if let Some(ref dir) = self.server.binary_dir {
            return Ok(PathBuf::from(dir));
        }

        let exe = std::env::current_exe()
            .map_err(|e| ConfigError::paths(format!("Cannot locate current executable: {e}")))?;
        let exe_dir = exe
            .parent()
            .ok_or_else(|| ConfigError::paths("Current executable has no parent directory"))?;

        Ok(exe_dir.join(DEFAULT_BINARY_DIR_NAME))
    }

    /// Absolute path of the server's JSON config file.
    pub fn server_config_path(&self) -> ConfigErrorResult<PathBuf> {
        Ok(self.binary_dir()?.join(&self.server.config_file))
    }

    /// Directory model files are resolved against.
    pub fn user_data_dir(&self) -> ConfigErrorResult<PathBuf> {
        if let Some(ref dir) = self.paths.user_data_dir {
            return Ok(PathBuf::from(dir));
        }

        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoPlatformDir { kind: "data" })
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  server: {}:{}", self.server.host, self.server.port);
        info!(
            "  binaries: {} (config {})",
            self.server.binary_dir.as_deref().unwrap_or("<exe dir>/nitro"),
            self.server.config_file
        );
        if let Some(ref name) = self.server.binary_name {
            info!("  binary override: {name}");
        }
        info!(
            "  user data: {}",
            self.paths
                .user_data_dir
                .as_deref()
                .unwrap_or("<platform data dir>")
        );
        info!(
            "  port reclaim: poll {}ms, grace {}ms",
            self.timing.port_poll_interval_ms, self.timing.port_grace_timeout_ms
        );
        info!(
            "  readiness: poll {}ms, timeout {}ms (kill on timeout: {})",
            self.timing.readiness_poll_interval_ms,
            self.timing.readiness_timeout_ms,
            self.timing.kill_on_readiness_timeout
        );
        info!("  logging: {} (dir {})", self.logging.level, self.logging.dir);
    }

    /// Apply NITRO_* environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("NITRO_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("NITRO_SERVER_PORT", &mut self.server.port);
        Self::apply_env_option_string("NITRO_BINARY_DIR", &mut self.server.binary_dir);
        Self::apply_env_string("NITRO_SERVER_CONFIG_FILE", &mut self.server.config_file);
        Self::apply_env_option_string("NITRO_BINARY_NAME", &mut self.server.binary_name);

        // Paths
        Self::apply_env_option_string("NITRO_USER_DATA_DIR", &mut self.paths.user_data_dir);

        // Timing
        Self::apply_env_parse(
            "NITRO_PORT_POLL_INTERVAL_MS",
            &mut self.timing.port_poll_interval_ms,
        );
        Self::apply_env_parse(
            "NITRO_PORT_GRACE_TIMEOUT_MS",
            &mut self.timing.port_grace_timeout_ms,
        );
        Self::apply_env_parse(
            "NITRO_READINESS_POLL_INTERVAL_MS",
            &mut self.timing.readiness_poll_interval_ms,
        );
        Self::apply_env_parse(
            "NITRO_READINESS_TIMEOUT_MS",
            &mut self.timing.readiness_timeout_ms,
        );
        Self::apply_env_bool(
            "NITRO_KILL_ON_READINESS_TIMEOUT",
            &mut self.timing.kill_on_readiness_timeout,
        );

        // Logging
        if let Ok(val) = std::env::var("NITRO_LOG_LEVEL") {
            self.logging.level = LogLevel::parse_lenient(&val);
        }
        Self::apply_env_string("NITRO_LOG_DIR", &mut self.logging.dir);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
