//! Lifecycle supervision for a local nitro inference server.
//!
//! [`Supervisor::init_model`] runs the launch pipeline: free the well-known
//! port, point the server config at the model, spawn the platform binary and
//! wait until it accepts connections.

mod config_patcher;
mod error;
mod exit_record;
mod init_response;
mod launcher;
mod log_sink;
mod model_ref;
mod platform;
mod port;
mod process_handle;
mod process_state;
mod readiness;
mod settings;
mod stage;
mod supervisor;

#[cfg(test)]
mod tests;

pub use config_patcher::{ConfigPatcher, MODEL_PATH_KEY, MODEL_SECTION_KEY};
pub use error::{Result as SupervisorResult, SupervisorError};
pub use exit_record::ExitRecord;
pub use init_response::InitResponse;
pub use launcher::{LaunchedProcess, ProcessLauncher};
pub use log_sink::{ChannelSink, LogSink, OutputLine, OutputStream, TracingSink};
pub use model_ref::ModelRef;
pub use platform::{CpuArch, OsFamily, Platform};
pub use port::PortReconciler;
pub use process_handle::ServerProcessHandle;
pub use process_state::ProcessState;
pub use readiness::ReadinessGate;
pub use settings::SupervisorSettings;
pub use stage::Stage;
pub use supervisor::Supervisor;
