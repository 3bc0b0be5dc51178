//! Inbound provisioning requests

use crate::error::{ProvisionError, Result};
use crate::gateway::Outputs;
use serde::{Deserialize, Serialize};

/// Request type sent by the deployment orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::Create => write!(f, "Create"),
            RequestType::Update => write!(f, "Update"),
            RequestType::Delete => write!(f, "Delete"),
        }
    }
}

/// What a request asks the handler to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Run the lifecycle to a terminal state
    CreateOrUpdate,
    /// Best-effort teardown, always reported as success
    Delete,
}

/// One deployment event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisioningRequest {
    pub request_type: RequestType,

    pub stack_id: String,

    pub request_id: String,

    pub logical_resource_id: String,

    /// Present on Update/Delete, absent on Create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    /// Callback address for the completion report
    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    /// Orchestrator-side type name (e.g., "Custom::MskPlugin")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Backend-specific input
    #[serde(default)]
    pub resource_properties: Outputs,
}

impl ProvisioningRequest {
    /// Parse an event from its JSON form
    pub fn from_json(raw: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(raw)?;
        if request.response_url.trim().is_empty() {
            return Err(ProvisionError::InvalidEvent(
                "ResponseURL is empty".to_string(),
            ));
        }
        Ok(request)
    }

    pub fn disposition(&self) -> Disposition {
        classify(self)
    }

    /// Get a resource property as a specific type
    pub fn property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.resource_properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Decide between the create path and the delete path
pub fn classify(request: &ProvisioningRequest) -> Disposition {
    match request.request_type {
        RequestType::Create | RequestType::Update => Disposition::CreateOrUpdate,
        RequestType::Delete => Disposition::Delete,
    }
}
