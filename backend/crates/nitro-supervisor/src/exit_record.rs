use chrono::{DateTime, Utc};

/// How the last server process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRecord {
    pub pid: u32,
    /// `None` when terminated by a signal
    pub code: Option<i32>,
    pub exited_at: DateTime<Utc>,
}
