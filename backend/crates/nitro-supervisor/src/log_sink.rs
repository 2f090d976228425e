//! Destinations for the server's stdout/stderr.

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line written by the server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub pid: u32,
    pub stream: OutputStream,
    pub line: String,
}

/// Receives server output line by line.
pub trait LogSink: Send + Sync + 'static {
    fn accept(&self, line: OutputLine);
}

/// Forwards server output to `tracing` under the `nitro` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn accept(&self, line: OutputLine) {
        match line.stream {
            OutputStream::Stdout => info!(target: "nitro", pid = line.pid, "{}", line.line),
            OutputStream::Stderr => warn!(target: "nitro", pid = line.pid, "{}", line.line),
        }
    }
}

/// Exposes server output as an async stream of [`OutputLine`]s.
///
/// Lines are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutputLine>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutputLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    fn accept(&self, line: OutputLine) {
        let _ = self.tx.send(line);
    }
}
