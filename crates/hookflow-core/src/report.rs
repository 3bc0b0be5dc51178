//! Completion reporting
//!
//! Builds the fixed-shape response envelope and delivers it to the request's
//! callback address with a single PUT.

use crate::error::{ProvisionError, Result};
use crate::gateway::Outputs;
use crate::request::ProvisioningRequest;
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

/// Final status of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Success,
    Failed,
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultStatus::Success => write!(f, "SUCCESS"),
            ResultStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one provisioning request
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningResult {
    pub status: ResultStatus,

    /// Identifier of the resource, if it produced one of its own
    pub physical_resource_id: Option<String>,

    pub data: Outputs,

    /// Failure cause
    pub reason: Option<String>,
}

impl ProvisioningResult {
    pub fn success(physical_resource_id: Option<String>, data: Outputs) -> Self {
        Self {
            status: ResultStatus::Success,
            physical_resource_id,
            data,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            physical_resource_id: None,
            data: Outputs::new(),
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Invocation-level context the reporter needs
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Runtime log stream name; doubles as the fallback physical id
    pub log_stream_name: String,
}

impl ReportContext {
    pub fn new(log_stream_name: impl Into<String>) -> Self {
        Self {
            log_stream_name: log_stream_name.into(),
        }
    }

    fn diagnostic_pointer(&self) -> String {
        format!(
            "See the details in CloudWatch Log Stream: {}",
            self.log_stream_name
        )
    }
}

/// JSON body sent to the callback address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseEnvelope {
    pub stack_id: String,
    pub request_id: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Outputs::is_empty")]
    pub data: Outputs,
}

impl ResponseEnvelope {
    pub fn build(
        request: &ProvisioningRequest,
        result: &ProvisioningResult,
        context: &ReportContext,
    ) -> Self {
        let reason = match result.status {
            ResultStatus::Success => None,
            ResultStatus::Failed => Some(match &result.reason {
                Some(cause) => format!("{} ({})", cause, context.diagnostic_pointer()),
                None => context.diagnostic_pointer(),
            }),
        };

        Self {
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            status: result.status,
            reason,
            physical_resource_id: result
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| context.log_stream_name.clone()),
            logical_resource_id: request.logical_resource_id.clone(),
            data: result.data.clone(),
        }
    }
}

/// Delivery channel for the serialized envelope
#[async_trait]
pub trait CallbackTransport: Send + Sync {
    async fn put(&self, url: &str, body: Vec<u8>) -> Result<()>;
}

/// HTTP PUT delivery
pub struct HttpCallback {
    client: reqwest::Client,
}

impl HttpCallback {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpCallback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackTransport for HttpCallback {
    async fn put(&self, url: &str, body: Vec<u8>) -> Result<()> {
        // The presigned callback URL is signed without a content type.
        let length = body.len();
        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await
            .map_err(|e| ProvisionError::CallbackDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProvisionError::CallbackDelivery(format!(
                "callback returned {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}

/// Sends the completion report of one invocation
///
/// `report` consumes the reporter, so an invocation can deliver at most once.
pub struct CompletionReporter<'a> {
    transport: &'a dyn CallbackTransport,
    context: ReportContext,
}

impl<'a> CompletionReporter<'a> {
    pub fn new(transport: &'a dyn CallbackTransport, context: ReportContext) -> Self {
        Self { transport, context }
    }

    pub async fn report(
        self,
        request: &ProvisioningRequest,
        result: &ProvisioningResult,
    ) -> Result<ResponseEnvelope> {
        let envelope = ResponseEnvelope::build(request, result, &self.context);
        let body = serde_json::to_vec(&envelope)?;

        tracing::debug!(
            body = %String::from_utf8_lossy(&body),
            "Response body"
        );

        match self.transport.put(&request.response_url, body).await {
            Ok(()) => {
                tracing::info!(
                    request_id = %request.request_id,
                    status = %envelope.status,
                    "Completion response sent"
                );
                Ok(envelope)
            }
            Err(e) => {
                tracing::error!(request_id = %request.request_id, error = %e, "Could not send completion response");
                Err(match e {
                    ProvisionError::CallbackDelivery(_) => e,
                    other => ProvisionError::CallbackDelivery(other.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestType;

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            request_type: RequestType::Create,
            stack_id: "stack-1".to_string(),
            request_id: "req-1".to_string(),
            logical_resource_id: "MskBroker".to_string(),
            physical_resource_id: None,
            response_url: "http://localhost/cb".to_string(),
            resource_type: None,
            resource_properties: Outputs::new(),
        }
    }

    #[test]
    fn test_success_envelope_has_no_reason() {
        let mut data = Outputs::new();
        data.insert("Broker".to_string(), "b-1.example:9092".into());
        let result = ProvisioningResult::success(None, data);

        let envelope = ResponseEnvelope::build(&request(), &result, &ReportContext::new("2026/10/19/[$LATEST]abc"));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["Status"], "SUCCESS");
        assert!(json.get("Reason").is_none());
        assert_eq!(json["PhysicalResourceId"], "2026/10/19/[$LATEST]abc");
        assert_eq!(json["LogicalResourceId"], "MskBroker");
        assert_eq!(json["Data"]["Broker"], "b-1.example:9092");
    }

    #[test]
    fn test_failed_envelope_points_at_logs() {
        let result = ProvisioningResult::failed("Backend reported FAILED: quota exceeded");
        let envelope = ResponseEnvelope::build(&request(), &result, &ReportContext::new("stream-7"));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["Status"], "FAILED");
        let reason = json["Reason"].as_str().unwrap();
        assert!(reason.contains("quota exceeded"));
        assert!(reason.contains("See the details in CloudWatch Log Stream: stream-7"));
        assert!(json.get("Data").is_none());
    }

    #[test]
    fn test_own_physical_id_wins_over_fallback() {
        let result = ProvisioningResult::success(Some("arn:plugin/1".to_string()), Outputs::new());
        let envelope = ResponseEnvelope::build(&request(), &result, &ReportContext::new("stream-7"));
        assert_eq!(envelope.physical_resource_id, "arn:plugin/1");
    }
}
