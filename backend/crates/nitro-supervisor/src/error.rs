use crate::Stage;

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Invalid model reference: {message} {location}")]
    InvalidInput {
        message: String,
        location: ErrorLocation,
    },

    #[error("Server config at {path} is corrupt: {message} {location}")]
    ConfigCorrupt {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to write server config at {path}: {source} {location}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("No server binary for platform {os}/{arch} {location}")]
    UnsupportedPlatform {
        os: String,
        arch: String,
        location: ErrorLocation,
    },

    #[error("Failed to launch server binary {path}: {source} {location}")]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Server did not accept connections on port {port} within {timeout_ms}ms {location}")]
    ReadinessTimeout {
        port: u16,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Failed to reclaim port {port}: {message} {location}")]
    PortReclaimFailed {
        port: u16,
        message: String,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn config_corrupt<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::ConfigCorrupt {
            path: path.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn port_reclaim_failed<S: Into<String>>(port: u16, message: S) -> Self {
        Self::PortReclaimFailed {
            port,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Pipeline step that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidInput { .. } => Stage::Validate,
            Self::PortReclaimFailed { .. } => Stage::ReclaimPort,
            Self::ConfigCorrupt { .. } | Self::ConfigWrite { .. } => Stage::PatchConfig,
            Self::UnsupportedPlatform { .. } | Self::LaunchFailed { .. } => Stage::Launch,
            Self::ReadinessTimeout { .. } => Stage::AwaitReady,
        }
    }

    /// Whether retrying `init_model` unchanged may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ReadinessTimeout { .. } | Self::PortReclaimFailed { .. }
        )
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Model not found, please download again.",
            Self::ConfigCorrupt { .. } => {
                "The server configuration file could not be parsed. \
                   Fix or delete it and try again."
            }
            Self::ConfigWrite { .. } => {
                "Unable to write the server configuration. \
                   Check file permissions in the server directory."
            }
            Self::UnsupportedPlatform { .. } => {
                "No inference server build exists for this platform. \
                   Set server.binary_name to use a custom build."
            }
            Self::LaunchFailed { .. } => {
                "The inference server could not be started. \
                   The installation may be incomplete; please reinstall."
            }
            Self::ReadinessTimeout { .. } => {
                "The inference server is taking too long to start. \
                   Try again or check the logs."
            }
            Self::PortReclaimFailed { .. } => {
                "Another application is holding the server port. \
                   Close it or restart your computer."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
