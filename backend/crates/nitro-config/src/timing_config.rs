use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_PORT_GRACE_TIMEOUT_MS, DEFAULT_PORT_POLL_INTERVAL_MS,
    DEFAULT_READINESS_POLL_INTERVAL_MS, DEFAULT_READINESS_TIMEOUT_MS,
};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// How often to re-check an occupied port before reclaiming it
    pub port_poll_interval_ms: u64,
    /// How long an occupied port may stay bound before its holder is killed
    pub port_grace_timeout_ms: u64,
    pub readiness_poll_interval_ms: u64,
    pub readiness_timeout_ms: u64,
    /// Kill the server if it never becomes reachable
    pub kill_on_readiness_timeout: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            port_poll_interval_ms: DEFAULT_PORT_POLL_INTERVAL_MS,
            port_grace_timeout_ms: DEFAULT_PORT_GRACE_TIMEOUT_MS,
            readiness_poll_interval_ms: DEFAULT_READINESS_POLL_INTERVAL_MS,
            readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT_MS,
            kill_on_readiness_timeout: false,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port_poll_interval_ms == 0 || self.readiness_poll_interval_ms == 0 {
            return Err(ConfigError::timing("poll intervals must be > 0"));
        }

        if self.readiness_timeout_ms == 0 {
            return Err(ConfigError::timing("timing.readiness_timeout_ms must be > 0"));
        }

        if self.port_poll_interval_ms > self.port_grace_timeout_ms {
            return Err(ConfigError::timing(format!(
                "timing.port_poll_interval_ms ({}) exceeds port_grace_timeout_ms ({})",
                self.port_poll_interval_ms, self.port_grace_timeout_ms
            )));
        }

        if self.readiness_poll_interval_ms > self.readiness_timeout_ms {
            return Err(ConfigError::timing(format!(
                "timing.readiness_poll_interval_ms ({}) exceeds readiness_timeout_ms ({})",
                self.readiness_poll_interval_ms, self.readiness_timeout_ms
            )));
        }

        Ok(())
    }
}
