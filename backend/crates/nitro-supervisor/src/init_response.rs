use crate::{Stage, SupervisorResult};

use serde::Serialize;

/// Payload handed back to the UI: `{}` on success, `{"error": ...}` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_hint: Option<&'static str>,
}

impl InitResponse {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<SupervisorResult<()>> for InitResponse {
    fn from(result: SupervisorResult<()>) -> Self {
        match result {
            Ok(()) => Self::default(),
            Err(e) => Self {
                error: Some(e.to_string()),
                stage: Some(e.stage()),
                recovery_hint: Some(e.recovery_hint()),
            },
        }
    }
}
