use anyhow::Context;
use hookflow_aws::AwsSettings;
use hookflow_core::{
    CompletionReporter, Disposition, HttpCallback, Outputs, ProvisioningRequest,
    ProvisioningResult, ReportContext, RequestType, ResourceHandler, ResourceKind,
};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

pub async fn handle(
    kind: ResourceKind,
    event: Option<&Path>,
    log_stream_name: String,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let raw = read_event(event)?;
    let context = ReportContext::new(log_stream_name);
    let transport = HttpCallback::new();

    // Once the callback address is known, every failure is reported through it.
    let request = match ProvisioningRequest::from_json(&raw) {
        Ok(request) => request,
        Err(e) => {
            let Some(request) = salvage_request(&raw) else {
                return Err(e.into());
            };
            tracing::error!(request_id = %request.request_id, error = %e, "Malformed event");
            let result = ProvisioningResult::failed(format!("Malformed event: {}", e));
            let envelope = CompletionReporter::new(&transport, context)
                .report(&request, &result)
                .await?;
            println!("{}", serde_json::to_string(&envelope)?);
            return Ok(());
        }
    };

    let registry = match hookflow_config::load_registry(config) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!(request_id = %request.request_id, error = %e, "Could not load profiles");
            let result = match request.disposition() {
                Disposition::Delete => ProvisioningResult::success(
                    request.physical_resource_id.clone(),
                    Outputs::new(),
                ),
                Disposition::CreateOrUpdate => {
                    ProvisioningResult::failed(format!("Could not load profiles: {}", e))
                }
            };
            let envelope = CompletionReporter::new(&transport, context)
                .report(&request, &result)
                .await?;
            println!("{}", serde_json::to_string(&envelope)?);
            return Ok(());
        }
    };
    let profile = registry.get(kind);

    let sdk_config = hookflow_aws::load_sdk_config().await;
    let gateway = hookflow_aws::gateway_for(kind, &sdk_config, AwsSettings::from_env());

    let envelope = ResourceHandler::new(gateway.as_ref(), profile, &transport)
        .handle(&request, context)
        .await?;

    println!("{}", serde_json::to_string(&envelope)?);
    Ok(())
}

fn read_event(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read event from stdin")?;
            Ok(raw)
        }
    }
}

/// Rebuild enough of an unparseable event to address its completion report
///
/// `None` when the event carries no usable `ResponseURL`.
fn salvage_request(raw: &str) -> Option<ProvisioningRequest> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let response_url = field("ResponseURL");
    if response_url.trim().is_empty() {
        return None;
    }

    Some(ProvisioningRequest {
        request_type: RequestType::Create,
        stack_id: field("StackId"),
        request_id: field("RequestId"),
        logical_resource_id: field("LogicalResourceId"),
        physical_resource_id: value
            .get("PhysicalResourceId")
            .and_then(Value::as_str)
            .map(str::to_string),
        response_url,
        resource_type: None,
        resource_properties: Outputs::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salvage_unknown_request_type() {
        let raw = r#"{
            "RequestType": "Replace",
            "ResponseURL": "http://localhost/cb",
            "StackId": "stack-1",
            "RequestId": "req-1",
            "LogicalResourceId": "MskPlugin",
            "PhysicalResourceId": "arn:plugin/old"
        }"#;
        assert!(ProvisioningRequest::from_json(raw).is_err());

        let request = salvage_request(raw).unwrap();
        assert_eq!(request.response_url, "http://localhost/cb");
        assert_eq!(request.stack_id, "stack-1");
        assert_eq!(request.request_id, "req-1");
        assert_eq!(request.logical_resource_id, "MskPlugin");
        assert_eq!(request.physical_resource_id.as_deref(), Some("arn:plugin/old"));
    }

    #[test]
    fn test_salvage_needs_callback() {
        assert!(salvage_request(r#"{"RequestType": "Replace"}"#).is_none());
        assert!(salvage_request(r#"{"ResponseURL": "  "}"#).is_none());
        assert!(salvage_request("not json").is_none());
    }
}
