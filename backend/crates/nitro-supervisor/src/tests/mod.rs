mod launcher;
mod readiness;

use crate::{ProcessState, Supervisor, SupervisorSettings};

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub(crate) const FAKE_BINARY: &str = "fake_nitro";

/// Long-running stand-in for the server: echoes its arguments, then idles.
pub(crate) const SLEEPING_SERVER: &str = r#"#!/bin/sh
echo "loading config $1"
echo "cwd $(pwd)"
echo "warming up" >&2
exec sleep 30
"#;

/// Stand-in that exits on its own with code 3.
pub(crate) const EXITING_SERVER: &str = r#"#!/bin/sh
sleep 1
exit 3
"#;

/// Temp directory layout shared by process tests
pub(crate) struct Fixture {
    pub _temp: TempDir,
    pub settings: SupervisorSettings,
}

impl Fixture {
    pub(crate) fn binary_dir(&self) -> &Path {
        &self.settings.binary_dir
    }

    pub(crate) fn config_path(&self) -> &Path {
        &self.settings.config_path
    }

    pub(crate) fn user_data_dir(&self) -> &Path {
        &self.settings.user_data_dir
    }
}

/// Settings on a free port with short timings and the fake binary name.
pub(crate) fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let binary_dir = temp.path().join("nitro");
    let user_data_dir = temp.path().join("userdata");
    std::fs::create_dir_all(&binary_dir).unwrap();
    std::fs::create_dir_all(&user_data_dir).unwrap();

    let mut settings = SupervisorSettings::new(&binary_dir, &user_data_dir);
    settings.port = free_port();
    settings.binary_name = Some(FAKE_BINARY.to_string());
    settings.port_poll_interval = Duration::from_millis(20);
    settings.port_grace_timeout = Duration::from_millis(200);
    settings.readiness_poll_interval = Duration::from_millis(20);
    settings.readiness_timeout = Duration::from_secs(3);

    Fixture {
        _temp: temp,
        settings,
    }
}

/// Ask the OS for a port nobody is listening on.
pub(crate) fn free_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    listener.local_addr().unwrap().port()
}

#[cfg(unix)]
pub(crate) fn write_fake_server(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(FAKE_BINARY);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Play the server's part: bind the port once the supervisor reports Launching.
///
/// The listener is returned so the test decides when the port is released.
pub(crate) fn listen_when_launching(
    supervisor: &Supervisor,
) -> JoinHandle<tokio::net::TcpListener> {
    let mut rx = supervisor.subscribe();
    let host = supervisor.settings().host.clone();
    let port = supervisor.settings().port;

    tokio::spawn(async move {
        rx.wait_for(|state| matches!(state, ProcessState::Launching { .. }))
            .await
            .unwrap();

        // A reclaimed holder may still be exiting.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            match tokio::net::TcpListener::bind((host.as_str(), port)).await {
                Ok(listener) => return listener,
                Err(e) if tokio::time::Instant::now() >= deadline => {
                    panic!("could not bind port {port}: {e}")
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
    })
}

/// Wait until the published state satisfies `predicate`.
pub(crate) async fn wait_for_state(
    rx: &mut watch::Receiver<ProcessState>,
    predicate: impl FnMut(&ProcessState) -> bool,
) -> ProcessState {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state change timed out")
        .unwrap()
        .clone()
}

/// Whether the port owner lookup tool is installed.
#[cfg(unix)]
pub(crate) fn lsof_available() -> bool {
    std::process::Command::new("lsof")
        .arg("-v")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

/// Start a separate process that listens on a fresh loopback port.
///
/// The listening socket is handed to `sleep` as its stdin, so this process
/// no longer holds it once the child is spawned.
#[cfg(unix)]
pub(crate) fn spawn_port_holder() -> (tokio::process::Child, u16) {
    use std::os::fd::OwnedFd;
    use std::process::Stdio;

    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = listener.local_addr().unwrap().port();

    let child = tokio::process::Command::new("sleep")
        .arg("30")
        .stdin(Stdio::from(OwnedFd::from(listener)))
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .unwrap();

    (child, port)
}

/// Wait for `child` to exit and return the signal that ended it.
#[cfg(unix)]
pub(crate) async fn wait_for_signal(child: &mut tokio::process::Child) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;

    tokio::time::timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("port holder was not killed")
        .unwrap()
        .signal()
}

/// Wait until `port` can be bound again.
pub(crate) async fn wait_until_free(host: &str, port: u16) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !crate::PortReconciler::is_free(host, port) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .is_ok()
}
