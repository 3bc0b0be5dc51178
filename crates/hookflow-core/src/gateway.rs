//! Backend gateway trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Resource-specific outputs reported back to the orchestrator
pub type Outputs = serde_json::Map<String, serde_json::Value>;

/// Backend abstraction trait
///
/// One implementation per provisioning API (broker lookup, plugin registry,
/// connector registry). The lifecycle controller only ever talks to a backend
/// through this trait.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Returns the backend name used in logs (e.g., "plugin-registry")
    fn name(&self) -> &str;

    /// Start provisioning the resource described by `properties`
    async fn initiate(&self, properties: &Outputs) -> Result<Initiated>;

    /// Read the current provisioning status of an in-flight resource
    async fn describe(&self, handle: &Handle) -> Result<Observation>;

    /// Whether this backend defines a delete call at all
    fn supports_teardown(&self) -> bool {
        false
    }

    /// Delete the resource identified by `handle`
    async fn teardown(&self, _handle: &Handle) -> Result<()> {
        Ok(())
    }
}

/// Opaque backend-assigned identifier of an in-flight resource (e.g., an ARN)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a successful initiating call
#[derive(Debug, Clone, Default)]
pub struct Initiated {
    /// Handle to poll, absent when the backend owns no resource of its own
    pub handle: Option<Handle>,

    /// Outputs known right after initiation
    pub outputs: Outputs,
}

impl Initiated {
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            outputs: Outputs::new(),
        }
    }

    /// Initiation that produced data but no resource (synchronous lookups)
    pub fn lookup(outputs: Outputs) -> Self {
        Self {
            handle: None,
            outputs,
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }
}

/// Status reported by one `describe` call
#[derive(Debug, Clone, Default)]
pub struct Observation {
    /// Raw backend state string (e.g., "CREATING", "RUNNING")
    pub state: String,

    /// Backend-supplied explanation, if any
    pub detail: Option<String>,

    /// Extra outputs discovered while polling
    pub outputs: Outputs,
}

impl Observation {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            detail: None,
            outputs: Outputs::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_output(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_serializes_as_plain_string() {
        let handle = Handle::new("arn:aws:kafkaconnect:plugin/msks3");
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, r#""arn:aws:kafkaconnect:plugin/msks3""#);
        assert_eq!(handle.to_string(), "arn:aws:kafkaconnect:plugin/msks3");
    }

    #[test]
    fn test_lookup_has_no_handle() {
        let init = Initiated::lookup(Outputs::new()).with_output("Broker", "b-1:9092".into());
        assert!(init.handle.is_none());
        assert_eq!(init.outputs["Broker"], "b-1:9092");
    }
}
