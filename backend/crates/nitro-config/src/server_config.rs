use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SERVER_CONFIG_FILE,
    MIN_PORT,
};

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Well-known port the inference server binds
    pub port: u16,
    /// Directory holding the server binaries (defaults to `<exe dir>/nitro`)
    pub binary_dir: Option<String>,
    /// Server JSON config, relative to `binary_dir`
    pub config_file: String,
    /// Skip the platform table and launch this binary instead
    pub binary_name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            binary_dir: None,
            config_file: String::from(DEFAULT_SERVER_CONFIG_FILE),
            binary_name: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port < MIN_PORT {
            return Err(ConfigError::server(format!(
                "server.port must be >= {}, got {}",
                MIN_PORT, self.port
            )));
        }

        if self.host != DEFAULT_HOST && self.host != "localhost" {
            return Err(ConfigError::server(format!(
                "server.host must be {DEFAULT_HOST} or localhost, got {}",
                self.host
            )));
        }

        let config_file = Path::new(&self.config_file);
        if self.config_file.is_empty()
            || config_file.is_absolute()
            || self.config_file.contains("..")
        {
            return Err(ConfigError::server(
                "server.config_file must be a non-empty relative path without '..'",
            ));
        }

        if let Some(ref name) = self.binary_name
            && (name.trim().is_empty() || name.contains('/') || name.contains('\\'))
        {
            return Err(ConfigError::server(
                "server.binary_name must be a bare file name",
            ));
        }

        Ok(())
    }
}
