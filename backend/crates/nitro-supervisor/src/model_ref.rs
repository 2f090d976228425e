use crate::{SupervisorError, SupervisorResult};

use std::fmt;
use std::path::{Path, PathBuf};

/// File name of a downloaded model, relative to the user data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef(String);

impl ModelRef {
    /// Rejects empty and whitespace-only names.
    #[track_caller]
    pub fn parse(file_name: &str) -> SupervisorResult<Self> {
        if file_name.trim().is_empty() {
            return Err(SupervisorError::invalid_input(
                "model file name must not be empty",
            ));
        }

        Ok(Self(file_name.to_string()))
    }

    pub fn file_name(&self) -> &str {
        &self.0
    }

    pub fn resolve(&self, user_data_dir: &Path) -> PathBuf {
        user_data_dir.join(&self.0)
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
