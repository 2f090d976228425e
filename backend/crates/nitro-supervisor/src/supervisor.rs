//! Inference server lifecycle.

use crate::{
    ConfigPatcher, ExitRecord, InitResponse, LogSink, ModelRef, PortReconciler, ProcessLauncher,
    ProcessState, ReadinessGate, ServerProcessHandle, SupervisorError, SupervisorResult,
    SupervisorSettings, TracingSink,
};

use nitro_config::{Config, ConfigErrorResult};

use std::future::Future;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use error_location::ErrorLocation;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

type ExitFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Owns the single inference server process.
///
/// Responsibilities:
/// - Free the well-known port before launching
/// - Point the server config at the requested model
/// - Spawn the platform binary and wait until it accepts connections
/// - Kill the process on request, on re-init and when dropped
pub struct Supervisor {
    settings: SupervisorSettings,
    launcher: ProcessLauncher,
    process: Arc<Mutex<Option<ServerProcessHandle>>>,
    last_exit: Arc<Mutex<Option<ExitRecord>>>,
    generation: AtomicU64,
    lifecycle: Mutex<()>,
    state_tx: watch::Sender<ProcessState>,
    state_rx: watch::Receiver<ProcessState>,
}

impl Supervisor {
    /// Supervisor logging server output through `tracing`.
    pub fn new(settings: SupervisorSettings) -> Self {
        Self::with_sink(settings, Arc::new(TracingSink))
    }

    pub fn with_sink(settings: SupervisorSettings, sink: Arc<dyn LogSink>) -> Self {
        let launcher =
            ProcessLauncher::new(sink).with_binary_override(settings.binary_name.clone());
        Self::with_launcher(settings, launcher)
    }

    pub fn with_launcher(settings: SupervisorSettings, launcher: ProcessLauncher) -> Self {
        let (state_tx, state_rx) = watch::channel(ProcessState::Absent);

        Self {
            settings,
            launcher,
            process: Arc::new(Mutex::new(None)),
            last_exit: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            lifecycle: Mutex::new(()),
            state_tx,
            state_rx,
        }
    }

    pub fn from_config(config: &Config) -> ConfigErrorResult<Self> {
        Ok(Self::new(SupervisorSettings::from_config(config)?))
    }

    /// Launch the server with `file_name` loaded and wait until it is reachable.
    ///
    /// A server that is already running is killed first. Calls are
    /// serialized; `kill_subprocess` may still run while one is in flight.
    pub async fn init_model(&self, file_name: &str) -> SupervisorResult<()> {
        let _lifecycle = self.lifecycle.lock().await;

        let result = self.run_pipeline(file_name).await;
        if let Err(ref e) = result {
            error!("Model initialization failed at stage {}: {e}", e.stage());
        }
        result
    }

    /// [`init_model`](Self::init_model) as a UI payload: `{}` or `{"error": ...}`.
    pub async fn init(&self, file_name: &str) -> InitResponse {
        self.init_model(file_name).await.into()
    }

    async fn run_pipeline(&self, file_name: &str) -> SupervisorResult<()> {
        let model = ModelRef::parse(file_name)?;
        info!("Initializing model {model}");

        self.terminate_existing().await;

        let settings = &self.settings;
        PortReconciler::ensure_free(
            &settings.host,
            settings.port,
            settings.port_poll_interval,
            settings.port_grace_timeout,
        )
        .await?;

        ConfigPatcher::apply(
            &settings.config_path,
            &model.resolve(&settings.user_data_dir),
        )?;

        let (generation, binary_path) = self.launch().await?;
        self.await_ready(generation, &binary_path).await
    }

    /// Kill a server left over from a previous init.
    async fn terminate_existing(&self) {
        let mut slot = self.process.lock().await;
        if let Some(handle) = slot.take() {
            warn!(
                "A server process (PID {}) is already running, killing it before re-initializing",
                handle.pid()
            );
            handle.kill();
            self.set_state(ProcessState::Absent);
        }
    }

    async fn launch(&self) -> SupervisorResult<(u64, PathBuf)> {
        let process = self
            .launcher
            .spawn(&self.settings.binary_dir, &self.settings.config_path)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let binary_path = process.binary_path.clone();

        // Held until the handle is stored so an early exit cannot race past it.
        let mut slot = self.process.lock().await;
        let handle = ServerProcessHandle::watch(process, generation, self.exit_handler(generation));
        let pid = handle.pid();
        *slot = Some(handle);
        self.set_state(ProcessState::Launching { pid });

        Ok((generation, binary_path))
    }

    /// Clears the slot if it still holds `generation` and records the exit.
    fn exit_handler(
        &self,
        generation: u64,
    ) -> impl FnOnce(ExitRecord) -> ExitFuture + Send + 'static {
        // Weak: the slot owns the handle, and dropping the handle kills the child.
        let process: Weak<Mutex<Option<ServerProcessHandle>>> = Arc::downgrade(&self.process);
        let last_exit = self.last_exit.clone();
        let state_tx = self.state_tx.clone();

        move |record: ExitRecord| -> ExitFuture {
            Box::pin(async move {
                *last_exit.lock().await = Some(record);

                let Some(process) = process.upgrade() else {
                    return;
                };
                let mut slot = process.lock().await;
                if slot
                    .as_ref()
                    .is_some_and(|handle| handle.generation() == generation)
                {
                    *slot = None;
                    let _ = state_tx.send(ProcessState::Absent);
                }
            })
        }
    }

    /// Someone else answering the port does not count once the launched
    /// process is gone.
    async fn await_ready(&self, generation: u64, binary_path: &Path) -> SupervisorResult<()> {
        let settings = &self.settings;
        let ready = ReadinessGate::wait_until_up(
            &settings.host,
            settings.port,
            settings.readiness_poll_interval,
            settings.readiness_timeout,
        )
        .await;

        let mut slot = self.process.lock().await;
        let current = slot
            .as_ref()
            .filter(|handle| handle.generation() == generation)
            .map(ServerProcessHandle::pid);

        match (ready, current) {
            (Ok(()), Some(pid)) => {
                self.set_state(ProcessState::Ready {
                    pid,
                    port: settings.port,
                });
                info!("Server (PID {pid}) is ready on port {}", settings.port);
                Ok(())
            }
            (Ok(()), None) => {
                warn!(
                    "Port {} answered, but the launched server is no longer held",
                    settings.port
                );
                Err(SupervisorError::LaunchFailed {
                    path: binary_path.to_path_buf(),
                    source: std::io::Error::other(
                        "server process exited before it became ready",
                    ),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            (Err(e), Some(pid)) if settings.kill_on_readiness_timeout => {
                warn!("Killing server (PID {pid}) that never became ready");
                if let Some(handle) = slot.take() {
                    handle.kill();
                }
                self.set_state(ProcessState::Absent);
                Err(e)
            }
            (Err(e), Some(pid)) => {
                warn!("Server (PID {pid}) not ready in time, leaving it running");
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }

    /// Terminate the server without waiting for it to exit.
    ///
    /// With nothing running, frees the well-known port instead in case a
    /// server was started elsewhere or outlived a crashed controller.
    pub async fn kill_subprocess(&self) {
        let handle = {
            let mut slot = self.process.lock().await;
            let handle = slot.take();
            if handle.is_some() {
                self.set_state(ProcessState::Absent);
            }
            handle
        };

        if let Some(handle) = handle {
            let pid = handle.pid();
            handle.kill();
            info!("Server process (PID {pid}) terminated");
            return;
        }

        info!("No server process is currently running");

        let settings = &self.settings;
        if PortReconciler::is_free(&settings.host, settings.port) {
            return;
        }

        match PortReconciler::reclaim(settings.port).await {
            Ok(pids) => info!("Reclaimed port {} from PID(s) {pids:?}", settings.port),
            Err(e) => warn!("Could not reclaim port {}: {e}", settings.port),
        }
    }

    /// Kill the server and release everything else the supervisor holds.
    pub async fn dispose(&self) {
        self.kill_subprocess().await;
        self.set_state(ProcessState::Absent);
        info!("Supervisor disposed");
    }

    fn set_state(&self, state: ProcessState) {
        let _ = self.state_tx.send(state);
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.state_rx.clone()
    }

    /// Get current state.
    pub fn state(&self) -> ProcessState {
        self.state_rx.borrow().clone()
    }

    /// Port the server accepts connections on, once ready.
    pub fn port(&self) -> Option<u16> {
        match *self.state_rx.borrow() {
            ProcessState::Ready { port, .. } => Some(port),
            _ => None,
        }
    }

    /// PID of the held server process, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.process.lock().await.as_ref().map(ServerProcessHandle::pid)
    }

    /// How the most recent server process ended.
    pub async fn last_exit(&self) -> Option<ExitRecord> {
        self.last_exit.lock().await.clone()
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    pub fn launcher(&self) -> &ProcessLauncher {
        &self.launcher
    }
}
