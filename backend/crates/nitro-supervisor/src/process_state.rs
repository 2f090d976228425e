/// Observable state of the supervised server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    /// No server process is held
    Absent,
    /// Spawned, not yet accepting connections
    Launching { pid: u32 },
    /// Accepting connections on the well-known port
    Ready { pid: u32, port: u16 },
}

impl ProcessState {
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Absent => None,
            Self::Launching { pid } | Self::Ready { pid, .. } => Some(*pid),
        }
    }
}
