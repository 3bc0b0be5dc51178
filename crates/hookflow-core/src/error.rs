//! Provisioning error types

use std::time::Duration;
use thiserror::Error;

/// Provisioning errors
///
/// Everything up to [`ProvisionError::MissingHandle`] is a lifecycle failure
/// and ends up as a FAILED result. [`ProvisionError::CallbackDelivery`] is the
/// only kind that escapes an invocation.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Initiation failed: {0}")]
    Initiation(String),

    #[error("Backend reported {state}: {detail}")]
    TerminalFailure { state: String, detail: String },

    #[error("Timed out after {attempts} status checks (last state: {last_state})")]
    PollTimeout { attempts: u32, last_state: String },

    #[error("Polling deadline exceeded after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    #[error("Status query failed: {0}")]
    StatusQuery(String),

    #[error("Backend returned no handle to poll")]
    MissingHandle,

    #[error("Could not send completion response: {0}")]
    CallbackDelivery(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProvisionError {
    /// Whether this error means the backend never reached a terminal state in time
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProvisionError::PollTimeout { .. } | ProvisionError::DeadlineExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
