use crate::{ExitRecord, LaunchedProcess};

use std::future::Future;

use chrono::Utc;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Exclusive handle to the running server process.
///
/// The child itself is owned by a watcher task. Dropping the handle without
/// calling [`kill`](Self::kill) terminates the process as well.
#[derive(Debug)]
pub struct ServerProcessHandle {
    pid: u32,
    generation: u64,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ServerProcessHandle {
    /// Take ownership of `process` and run `on_exit` once it has exited.
    pub(crate) fn watch<F, Fut>(process: LaunchedProcess, generation: u64, on_exit: F) -> Self
    where
        F: FnOnce(ExitRecord) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let LaunchedProcess { pid, mut child, .. } = process;
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let exited = tokio::select! {
                status = child.wait() => Some(status),
                _ = kill_rx => None,
            };

            let status = match exited {
                Some(status) => status,
                None => {
                    if let Err(e) = child.start_kill() {
                        warn!("Failed to signal server process (PID {pid}): {e}");
                    }
                    child.wait().await
                }
            };

            let code = match status {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!("Failed to wait for server process (PID {pid}): {e}");
                    None
                }
            };

            info!("Server process (PID {pid}) exited with code {code:?}");

            on_exit(ExitRecord {
                pid,
                code,
                exited_at: Utc::now(),
            })
            .await;
        });

        Self {
            pid,
            generation,
            kill_tx: Some(kill_tx),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Launch counter value this handle was created with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal termination without waiting for the exit.
    pub fn kill(mut self) {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
    }
}
