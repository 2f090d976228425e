use std::fmt;

use serde::Serialize;

/// Step of the launch pipeline an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Checking the caller's model reference
    Validate,
    /// Freeing the well-known port
    ReclaimPort,
    /// Writing the model path into the server config
    PatchConfig,
    /// Resolving and spawning the server binary
    Launch,
    /// Waiting for the server to accept connections
    AwaitReady,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::ReclaimPort => "reclaim_port",
            Self::PatchConfig => "patch_config",
            Self::Launch => "launch",
            Self::AwaitReady => "await_ready",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
