use crate::tests::{FAKE_BINARY, SLEEPING_SERVER, fixture, write_fake_server};
use crate::{
    ChannelSink, OutputLine, OutputStream, Platform, ProcessLauncher, SupervisorError,
    TracingSink,
};

use std::sync::Arc;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::eq;
use serial_test::serial;
use tokio::sync::mpsc::UnboundedReceiver;

async fn next_line(rx: &mut UnboundedReceiver<OutputLine>) -> OutputLine {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no output from server")
        .expect("output channel closed")
}

#[test]
fn given_override_when_binary_name_then_override_wins() {
    // Given
    let launcher = ProcessLauncher::new(Arc::new(TracingSink))
        .with_platform(Platform::new("linux", "aarch64"))
        .with_binary_override(Some("nitro_custom".to_string()));

    // Then
    assert_that!(launcher.binary_name().unwrap().as_str(), eq("nitro_custom"));
}

#[test]
fn given_unmapped_platform_without_override_when_binary_name_then_unsupported() {
    // Given
    let launcher = ProcessLauncher::new(Arc::new(TracingSink))
        .with_platform(Platform::new("linux", "aarch64"));

    // Then
    assert!(matches!(
        launcher.binary_name(),
        Err(SupervisorError::UnsupportedPlatform { .. })
    ));
}

#[test]
fn given_mapped_platform_when_binary_name_then_table_entry() {
    let launcher = ProcessLauncher::new(Arc::new(TracingSink))
        .with_platform(Platform::new("macos", "aarch64"));

    assert_that!(launcher.binary_name().unwrap().as_str(), eq("nitro_mac_arm64"));
}

#[tokio::test]
async fn given_missing_binary_when_spawn_then_launch_failed_with_path() {
    // Given
    let fx = fixture();
    let launcher = ProcessLauncher::new(Arc::new(TracingSink))
        .with_binary_override(Some(FAKE_BINARY.to_string()));

    // When
    let result = launcher.spawn(fx.binary_dir(), fx.config_path());

    // Then
    match result {
        Err(SupervisorError::LaunchFailed { path, .. }) => {
            assert_eq!(path, fx.binary_dir().join(FAKE_BINARY));
        }
        other => panic!("expected LaunchFailed, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn given_fake_server_when_spawn_then_output_forwarded_to_sink() {
    // Given
    let fx = fixture();
    write_fake_server(fx.binary_dir(), SLEEPING_SERVER);
    let (sink, mut rx) = ChannelSink::new();
    let launcher = ProcessLauncher::new(Arc::new(sink))
        .with_binary_override(Some(FAKE_BINARY.to_string()));

    // When
    let mut process = launcher.spawn(fx.binary_dir(), fx.config_path()).unwrap();

    // Then
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while stdout.len() < 2 || stderr.is_empty() {
        let line = next_line(&mut rx).await;
        assert_that!(line.pid, eq(process.pid));
        match line.stream {
            OutputStream::Stdout => stdout.push(line.line),
            OutputStream::Stderr => stderr.push(line.line),
        }
    }

    assert_eq!(
        stdout[0],
        format!("loading config {}", fx.config_path().display())
    );
    assert!(stdout[1].starts_with("cwd "));
    assert!(stdout[1].ends_with("/nitro"));
    assert_eq!(stderr, vec!["warming up".to_string()]);
    assert_eq!(process.binary_path, fx.binary_dir().join(FAKE_BINARY));

    process.child.kill().await.unwrap();
}
