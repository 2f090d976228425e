use crate::{SupervisorError, SupervisorResult};

use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

pub struct ReadinessGate;

impl ReadinessGate {
    /// Wait for something to accept TCP connections on host:port.
    ///
    /// Each connect attempt is bounded by `poll_interval`. Whoever answers
    /// counts as ready; clearing stale listeners is the port reconciler's job.
    pub async fn wait_until_up(
        host: &str,
        port: u16,
        poll_interval: Duration,
        timeout: Duration,
    ) -> SupervisorResult<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if Self::is_up(host, port, poll_interval).await {
                debug!("Port {port} is accepting connections");
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SupervisorError::ReadinessTimeout {
                    port,
                    timeout_ms: timeout.as_millis() as u64,
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            tokio::time::sleep(poll_interval.min(remaining)).await;
        }
    }

    /// Single connect attempt.
    pub async fn is_up(host: &str, port: u16, attempt_timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(attempt_timeout, TcpStream::connect((host, port))).await,
            Ok(Ok(_))
        )
    }
}
