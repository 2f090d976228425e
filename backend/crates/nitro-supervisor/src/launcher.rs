//! Binary resolution and process spawning.

use crate::{LogSink, OutputLine, OutputStream, Platform, SupervisorError, SupervisorResult};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use error_location::ErrorLocation;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// A freshly spawned server whose output is already being forwarded.
#[derive(Debug)]
pub struct LaunchedProcess {
    pub pid: u32,
    pub binary_path: PathBuf,
    pub(crate) child: Child,
}

/// Starts the platform's server binary.
pub struct ProcessLauncher {
    platform: Platform,
    binary_override: Option<String>,
    sink: Arc<dyn LogSink>,
}

impl ProcessLauncher {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            platform: Platform::current(),
            binary_override: None,
            sink,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Launch `name` instead of consulting the platform table.
    pub fn with_binary_override(mut self, name: Option<String>) -> Self {
        self.binary_override = name;
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// File name of the binary to launch.
    #[track_caller]
    pub fn binary_name(&self) -> SupervisorResult<String> {
        match self.binary_override {
            Some(ref name) => Ok(name.clone()),
            None => self.platform.require_binary_name().map(str::to_string),
        }
    }

    /// Spawn `<binary_dir>/<binary> <config_path>` inside `binary_dir`.
    ///
    /// Stdout and stderr are forwarded to the sink line by line. Spawn
    /// errors (missing binary, permissions) surface immediately.
    #[track_caller]
    pub fn spawn(&self, binary_dir: &Path, config_path: &Path) -> SupervisorResult<LaunchedProcess> {
        let binary_path = binary_dir.join(self.binary_name()?);
        info!(
            "Launching {} with config {}",
            binary_path.display(),
            config_path.display()
        );

        let mut child = Command::new(&binary_path)
            .arg(config_path)
            .current_dir(binary_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::LaunchFailed {
                path: binary_path.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let pid = child.id().unwrap_or_default();
        info!("Spawned server process with PID {pid}");

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(Self::forward(stdout, pid, OutputStream::Stdout, self.sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(Self::forward(stderr, pid, OutputStream::Stderr, self.sink.clone()));
        }

        Ok(LaunchedProcess {
            pid,
            binary_path,
            child,
        })
    }

    async fn forward<R>(reader: R, pid: u32, stream: OutputStream, sink: Arc<dyn LogSink>)
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink.accept(OutputLine { pid, stream, line });
        }
        debug!("Server {stream:?} closed (PID {pid})");
    }
}
