//! MSK bootstrap broker lookup

use crate::error::{AwsError, Result};
use crate::settings::{self, AwsSettings};
use async_trait::async_trait;
use hookflow_core::{BackendGateway, Handle, Initiated, Observation, Outputs};

pub const BROKER_OUTPUT: &str = "Broker";

/// Looks up the bootstrap broker string of an MSK cluster
///
/// Nothing is created, so there is nothing to poll or tear down.
pub struct BrokerLookupGateway {
    client: aws_sdk_kafka::Client,
    cluster_arn: Option<String>,
}

impl BrokerLookupGateway {
    pub fn new(client: aws_sdk_kafka::Client, settings: &AwsSettings) -> Self {
        Self {
            client,
            cluster_arn: settings.msk_endpoint.clone(),
        }
    }

    pub fn from_conf(config: &aws_config::SdkConfig, settings: &AwsSettings) -> Self {
        Self::new(aws_sdk_kafka::Client::new(config), settings)
    }

    /// Bootstrap broker string of the cluster
    ///
    /// `ClusterArn` in `properties` takes precedence over `MSK_ENDPOINT`.
    pub async fn bootstrap_brokers(&self, properties: &Outputs) -> Result<String> {
        let cluster_arn = settings::required(
            properties,
            "ClusterArn",
            self.cluster_arn.as_deref(),
            "MSK_ENDPOINT",
        )?;

        tracing::debug!(cluster = %cluster_arn, "Fetching bootstrap brokers");
        let output = self
            .client
            .get_bootstrap_brokers()
            .cluster_arn(&cluster_arn)
            .send()
            .await
            .map_err(AwsError::kafka)?;

        output
            .bootstrap_broker_string()
            .map(str::to_string)
            .ok_or_else(|| {
                AwsError::UnexpectedResponse(format!(
                    "cluster {} returned no plaintext bootstrap brokers",
                    cluster_arn
                ))
            })
    }
}

#[async_trait]
impl BackendGateway for BrokerLookupGateway {
    fn name(&self) -> &str {
        "msk-broker-lookup"
    }

    async fn initiate(&self, properties: &Outputs) -> hookflow_core::Result<Initiated> {
        let brokers = self.bootstrap_brokers(properties).await?;
        tracing::info!(brokers = %brokers, "Resolved bootstrap brokers");

        let mut outputs = Outputs::new();
        outputs.insert(BROKER_OUTPUT.to_string(), brokers.into());
        Ok(Initiated::lookup(outputs))
    }

    async fn describe(&self, handle: &Handle) -> hookflow_core::Result<Observation> {
        Err(AwsError::UnexpectedResponse(format!(
            "broker lookup has no resource to describe ({})",
            handle
        ))
        .into())
    }
}
