//! Port availability checks and forced reclamation.

use crate::{SupervisorError, SupervisorResult};

use std::time::Duration;

use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const WILDCARD_HOST: &str = "0.0.0.0";

pub struct PortReconciler;

impl PortReconciler {
    /// Check if a port is available for binding.
    ///
    /// Attempts to bind to host:port and to the wildcard address. The
    /// wildcard probe catches `0.0.0.0` listeners that macOS and the BSDs
    /// let a specific-address bind coexist with.
    pub fn is_free(host: &str, port: u16) -> bool {
        Self::can_bind(host, port)
            && (host == WILDCARD_HOST || Self::can_bind(WILDCARD_HOST, port))
    }

    /// Each probe listener is dropped before the next bind.
    fn can_bind(host: &str, port: u16) -> bool {
        std::net::TcpListener::bind((host, port)).is_ok()
    }

    /// Make sure `port` can be bound before launching the server.
    ///
    /// Waits up to `grace_timeout` for the port to be released, then kills
    /// whatever still holds it. Does not re-check afterwards; the launch
    /// itself fails if the port stays unusable.
    pub async fn ensure_free(
        host: &str,
        port: u16,
        poll_interval: Duration,
        grace_timeout: Duration,
    ) -> SupervisorResult<()> {
        if Self::is_free(host, port) {
            return Ok(());
        }

        debug!(
            "Port {port} is in use, waiting up to {}ms for release",
            grace_timeout.as_millis()
        );

        let deadline = Instant::now() + grace_timeout;
        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(poll_interval.min(remaining)).await;
            if Self::is_free(host, port) {
                debug!("Port {port} released");
                return Ok(());
            }
        }

        warn!(
            "Port {port} still bound after {}ms, reclaiming it",
            grace_timeout.as_millis()
        );
        let killed = Self::reclaim(port).await?;
        info!("Reclaimed port {port} from PID(s) {killed:?}");

        Ok(())
    }

    /// Kill every process listening on `port`, except this one.
    ///
    /// Returns the PIDs that were signalled.
    pub async fn reclaim(port: u16) -> SupervisorResult<Vec<u32>> {
        let holders = Self::holder_pids(port).await?;
        if holders.is_empty() {
            return Err(SupervisorError::port_reclaim_failed(
                port,
                "no process holding the port could be identified",
            ));
        }

        let mut killed = Vec::with_capacity(holders.len());
        let mut failures = Vec::new();

        for pid in holders {
            match Self::kill_pid(pid) {
                Ok(()) => killed.push(pid),
                Err(e) => {
                    warn!("Failed to kill PID {pid} holding port {port}: {e}");
                    failures.push(format!("PID {pid}: {e}"));
                }
            }
        }

        if killed.is_empty() {
            return Err(SupervisorError::port_reclaim_failed(
                port,
                failures.join("; "),
            ));
        }

        Ok(killed)
    }

    /// Find PIDs listening on `port` via `lsof`.
    #[cfg(unix)]
    async fn holder_pids(port: u16) -> SupervisorResult<Vec<u32>> {
        let output = Command::new("lsof")
            .args(["-n", "-P", "-t"])
            .arg(format!("-iTCP:{port}"))
            .arg("-sTCP:LISTEN")
            .output()
            .await
            .map_err(|e| {
                SupervisorError::port_reclaim_failed(port, format!("failed to run lsof: {e}"))
            })?;

        // lsof exits 1 when nothing matches; an empty list covers that.
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::without_self(Self::parse_lsof_pids(&stdout)))
    }

    /// Find PIDs listening on `port` via `netstat`.
    #[cfg(windows)]
    async fn holder_pids(port: u16) -> SupervisorResult<Vec<u32>> {
        let output = Command::new("netstat")
            .args(["-ano", "-p", "tcp"])
            .output()
            .await
            .map_err(|e| {
                SupervisorError::port_reclaim_failed(port, format!("failed to run netstat: {e}"))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::without_self(Self::parse_netstat_pids(&stdout, port)))
    }

    #[cfg(not(any(unix, windows)))]
    async fn holder_pids(port: u16) -> SupervisorResult<Vec<u32>> {
        Err(SupervisorError::port_reclaim_failed(
            port,
            "port owner lookup is not supported on this platform",
        ))
    }

    fn without_self(pids: Vec<u32>) -> Vec<u32> {
        let own = std::process::id();
        pids.into_iter().filter(|pid| *pid != own).collect()
    }

    /// Parse `lsof -t` output: one PID per line.
    pub fn parse_lsof_pids(output: &str) -> Vec<u32> {
        let mut pids: Vec<u32> = output
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect();
        pids.sort_unstable();
        pids.dedup();
        pids
    }

    /// Parse `netstat -ano` rows listening on `port`.
    ///
    /// Rows look like `TCP    127.0.0.1:3928    0.0.0.0:0    LISTENING    1234`.
    pub fn parse_netstat_pids(output: &str, port: u16) -> Vec<u32> {
        let suffix = format!(":{port}");

        let mut pids: Vec<u32> = output
            .lines()
            .filter_map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                match fields.as_slice() {
                    [proto, local, _remote, state, pid]
                        if proto.eq_ignore_ascii_case("tcp")
                            && local.ends_with(&suffix)
                            && state.eq_ignore_ascii_case("listening") =>
                    {
                        pid.parse().ok()
                    }
                    _ => None,
                }
            })
            .collect();
        pids.sort_unstable();
        pids.dedup();
        pids
    }

    #[cfg(unix)]
    fn kill_pid(pid: u32) -> Result<(), String> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid).map_err(|_| format!("PID {pid} out of range"))?;
        kill(Pid::from_raw(raw), Signal::SIGKILL).map_err(|e| e.to_string())
    }

    #[cfg(windows)]
    fn kill_pid(pid: u32) -> Result<(), String> {
        use windows_sys::Win32::Foundation::CloseHandle;
        use windows_sys::Win32::System::Threading::{
            OpenProcess, PROCESS_TERMINATE, TerminateProcess,
        };

        // SAFETY: OpenProcess returns null on failure; the handle is closed
        // on every path after it has been opened.
        unsafe {
            let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
            if handle.is_null() {
                return Err(std::io::Error::last_os_error().to_string());
            }

            let terminated = TerminateProcess(handle, 1);
            let error = std::io::Error::last_os_error();
            CloseHandle(handle);

            if terminated == 0 {
                return Err(error.to_string());
            }
        }

        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    fn kill_pid(pid: u32) -> Result<(), String> {
        Err(format!("cannot signal PID {pid} on this platform"))
    }
}
