//! MSK Connect S3 sink connector deployment

use crate::broker::BrokerLookupGateway;
use crate::error::{AwsError, Result};
use crate::settings::{self, AwsSettings, DEFAULT_CONNECTOR_NAME, DEFAULT_TOPICS};
use async_trait::async_trait;
use aws_sdk_kafkaconnect::types::{
    ApacheKafkaCluster, Capacity, CloudWatchLogsLogDelivery, CustomPlugin, FirehoseLogDelivery,
    KafkaCluster, KafkaClusterClientAuthentication, KafkaClusterClientAuthenticationType,
    KafkaClusterEncryptionInTransit, KafkaClusterEncryptionInTransitType, LogDelivery, Plugin,
    ProvisionedCapacity, S3LogDelivery, Vpc, WorkerLogDelivery,
};
use hookflow_core::{BackendGateway, Handle, Initiated, Observation, Outputs};
use std::collections::HashMap;

pub const CONNECTOR_OUTPUT: &str = "ConnectorArn";

const KAFKA_CONNECT_VERSION: &str = "2.7.1";
const MCU_COUNT: i32 = 2;
const WORKER_COUNT: i32 = 2;
const PLUGIN_REVISION: i64 = 1;

/// Parameters of one `CreateConnector` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorRequest {
    pub name: String,
    pub bootstrap_servers: String,
    pub plugin_arn: String,
    pub topics: String,
    pub bucket_name: String,
    pub region: String,
    pub subnets: Vec<String>,
    pub security_group: String,
    pub role_arn: String,
    pub log_group: String,
}

impl ConnectorRequest {
    pub fn resolve(
        properties: &Outputs,
        settings: &AwsSettings,
        bootstrap_servers: String,
    ) -> Result<Self> {
        if settings.subnets.is_empty() {
            return Err(AwsError::MissingEnvVar("SUBNET_A"));
        }

        Ok(Self {
            name: settings::or_default(properties, "ConnectorName", DEFAULT_CONNECTOR_NAME),
            bootstrap_servers,
            plugin_arn: settings::required(
                properties,
                "PluginArn",
                settings.plugin_arn.as_deref(),
                "PLUGIN_ARN",
            )?,
            topics: settings::or_default(properties, "Topics", DEFAULT_TOPICS),
            bucket_name: env_setting(&settings.bucket_name, "BUCKET_NAME")?,
            region: env_setting(&settings.region, "REGION")?,
            subnets: settings.subnets.clone(),
            security_group: env_setting(&settings.security_group, "SECURITY_GROUP")?,
            role_arn: env_setting(&settings.role_name, "ROLE_NAME")?,
            log_group: env_setting(&settings.log_group, "LOG_GROUP")?,
        })
    }

    /// Connector properties of the Confluent S3 sink
    pub fn configuration(&self) -> HashMap<String, String> {
        [
            ("connector.class", "io.confluent.connect.s3.S3SinkConnector"),
            ("s3.region", self.region.as_str()),
            ("flush.size", "1"),
            ("schema.compatibility", "NONE"),
            ("tasks.max", "2"),
            ("topics", self.topics.as_str()),
            ("key.converter.schemas.enable", "false"),
            ("format.class", "io.confluent.connect.s3.format.json.JsonFormat"),
            (
                "partitioner.class",
                "io.confluent.connect.storage.partitioner.DefaultPartitioner",
            ),
            ("value.converter.schemas.enable", "false"),
            ("value.converter", "org.apache.kafka.connect.json.JsonConverter"),
            ("storage.class", "io.confluent.connect.s3.storage.S3Storage"),
            ("s3.bucket.name", self.bucket_name.as_str()),
            ("key.converter", "org.apache.kafka.connect.storage.StringConverter"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn capacity(&self) -> Capacity {
        let provisioned = ProvisionedCapacity::builder()
            .mcu_count(MCU_COUNT)
            .worker_count(WORKER_COUNT)
            .build();
        Capacity::builder().provisioned_capacity(provisioned).build()
    }

    fn kafka_cluster(&self) -> Result<KafkaCluster> {
        let vpc = Vpc::builder()
            .set_subnets(Some(self.subnets.clone()))
            .security_groups(&self.security_group)
            .build()?;
        let cluster = ApacheKafkaCluster::builder()
            .bootstrap_servers(&self.bootstrap_servers)
            .vpc(vpc)
            .build()?;
        Ok(KafkaCluster::builder().apache_kafka_cluster(cluster).build())
    }

    fn plugin(&self) -> Result<Plugin> {
        let custom = CustomPlugin::builder()
            .custom_plugin_arn(&self.plugin_arn)
            .revision(PLUGIN_REVISION)
            .build()?;
        Ok(Plugin::builder().custom_plugin(custom).build())
    }

    fn log_delivery(&self) -> LogDelivery {
        let workers = WorkerLogDelivery::builder()
            .cloud_watch_logs(
                CloudWatchLogsLogDelivery::builder()
                    .enabled(true)
                    .log_group(&self.log_group)
                    .build(),
            )
            .firehose(FirehoseLogDelivery::builder().enabled(false).build())
            .s3(S3LogDelivery::builder().enabled(false).build())
            .build();
        LogDelivery::builder().worker_log_delivery(workers).build()
    }
}

fn env_setting(value: &Option<String>, env: &'static str) -> Result<String> {
    value.clone().ok_or(AwsError::MissingEnvVar(env))
}

/// Deploys an S3 sink connector and waits for it to reach `RUNNING`
///
/// Connectors are left in place on delete.
pub struct ConnectorRegistryGateway {
    client: aws_sdk_kafkaconnect::Client,
    brokers: BrokerLookupGateway,
    settings: AwsSettings,
}

impl ConnectorRegistryGateway {
    pub fn new(
        client: aws_sdk_kafkaconnect::Client,
        brokers: BrokerLookupGateway,
        settings: AwsSettings,
    ) -> Self {
        Self {
            client,
            brokers,
            settings,
        }
    }

    pub fn from_conf(config: &aws_config::SdkConfig, settings: AwsSettings) -> Self {
        Self::new(
            aws_sdk_kafkaconnect::Client::new(config),
            BrokerLookupGateway::from_conf(config, &settings),
            settings,
        )
    }

    async fn create(&self, request: &ConnectorRequest) -> Result<String> {
        tracing::info!(
            name = %request.name,
            plugin = %request.plugin_arn,
            topics = %request.topics,
            "Creating connector"
        );

        let output = self
            .client
            .create_connector()
            .connector_name(&request.name)
            .capacity(request.capacity())
            .set_connector_configuration(Some(request.configuration()))
            .kafka_cluster(request.kafka_cluster()?)
            .kafka_cluster_client_authentication(
                KafkaClusterClientAuthentication::builder()
                    .authentication_type(KafkaClusterClientAuthenticationType::from("NONE"))
                    .build()?,
            )
            .kafka_cluster_encryption_in_transit(
                KafkaClusterEncryptionInTransit::builder()
                    .encryption_type(KafkaClusterEncryptionInTransitType::from("PLAINTEXT"))
                    .build()?,
            )
            .kafka_connect_version(KAFKA_CONNECT_VERSION)
            .plugins(request.plugin()?)
            .service_execution_role_arn(&request.role_arn)
            .log_delivery(request.log_delivery())
            .send()
            .await
            .map_err(AwsError::kafka_connect)?;

        output
            .connector_arn()
            .map(str::to_string)
            .ok_or_else(|| AwsError::UnexpectedResponse("CreateConnector returned no ARN".to_string()))
    }
}

#[async_trait]
impl BackendGateway for ConnectorRegistryGateway {
    fn name(&self) -> &str {
        "msk-connect-connector"
    }

    async fn initiate(&self, properties: &Outputs) -> hookflow_core::Result<Initiated> {
        let bootstrap_servers = self.brokers.bootstrap_brokers(properties).await?;
        let request = ConnectorRequest::resolve(properties, &self.settings, bootstrap_servers)?;
        let arn = self.create(&request).await?;

        Ok(Initiated::with_handle(Handle::new(arn.clone()))
            .with_output(CONNECTOR_OUTPUT, arn.into()))
    }

    async fn describe(&self, handle: &Handle) -> hookflow_core::Result<Observation> {
        let output = self
            .client
            .describe_connector()
            .connector_arn(handle.as_str())
            .send()
            .await
            .map_err(AwsError::kafka_connect)?;

        let state = output
            .connector_state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();
        let mut observation = Observation::new(state);
        if let Some(description) = output.state_description() {
            let detail = match (description.code(), description.message()) {
                (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
                (None, Some(message)) => Some(message.to_string()),
                (Some(code), None) => Some(code.to_string()),
                (None, None) => None,
            };
            if let Some(detail) = detail {
                observation = observation.with_detail(detail);
            }
        }
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> AwsSettings {
        AwsSettings {
            msk_endpoint: Some("arn:aws:kafka:us-east-1:1:cluster/msk/abc".to_string()),
            plugin_arn: Some("arn:aws:kafkaconnect:us-east-1:1:custom-plugin/msks3/1".to_string()),
            bucket_arn: None,
            bucket_name: Some("sales-archive".to_string()),
            region: Some("us-east-1".to_string()),
            subnets: vec!["subnet-a".to_string(), "subnet-b".to_string()],
            security_group: Some("sg-1".to_string()),
            role_name: Some("arn:aws:iam::1:role/connect".to_string()),
            log_group: Some("/msk/connect".to_string()),
        }
    }

    fn resolve(properties: serde_json::Value) -> Result<ConnectorRequest> {
        ConnectorRequest::resolve(
            properties.as_object().unwrap(),
            &settings(),
            "b-1.example:9092,b-2.example:9092".to_string(),
        )
    }

    #[test]
    fn test_configuration() {
        let config = resolve(json!({})).unwrap().configuration();

        assert_eq!(config.len(), 14);
        assert_eq!(config["connector.class"], "io.confluent.connect.s3.S3SinkConnector");
        assert_eq!(config["s3.region"], "us-east-1");
        assert_eq!(config["s3.bucket.name"], "sales-archive");
        assert_eq!(config["topics"], "salesorder");
        assert_eq!(config["tasks.max"], "2");
    }

    #[test]
    fn test_property_overrides() {
        let request = resolve(json!({
            "ConnectorName": "orders-sink",
            "Topics": "orders,returns",
            "PluginArn": "arn:plugin/override",
        }))
        .unwrap();

        assert_eq!(request.name, "orders-sink");
        assert_eq!(request.plugin_arn, "arn:plugin/override");
        assert_eq!(request.configuration()["topics"], "orders,returns");
    }

    #[test]
    fn test_defaults() {
        let request = resolve(json!({})).unwrap();
        assert_eq!(request.name, "kafka-connect-s3-connector");
        assert_eq!(request.bootstrap_servers, "b-1.example:9092,b-2.example:9092");
    }

    #[test]
    fn test_missing_environment() {
        let mut incomplete = settings();
        incomplete.log_group = None;
        let err = ConnectorRequest::resolve(&Outputs::new(), &incomplete, String::new()).unwrap_err();
        assert!(matches!(err, AwsError::MissingEnvVar("LOG_GROUP")));

        let mut no_subnets = settings();
        no_subnets.subnets.clear();
        let err = ConnectorRequest::resolve(&Outputs::new(), &no_subnets, String::new()).unwrap_err();
        assert!(matches!(err, AwsError::MissingEnvVar("SUBNET_A")));
    }

    #[test]
    fn test_request_shapes_build() {
        let request = resolve(json!({})).unwrap();
        let capacity = request.capacity();
        let provisioned = capacity.provisioned_capacity().unwrap();
        assert_eq!(provisioned.mcu_count(), MCU_COUNT);
        assert_eq!(provisioned.worker_count(), WORKER_COUNT);

        assert!(request.kafka_cluster().is_ok());
        assert!(request.plugin().is_ok());

        let log_delivery = request.log_delivery();
        let workers = log_delivery.worker_log_delivery().unwrap();
        let cloud_watch = workers.cloud_watch_logs().unwrap();
        assert!(cloud_watch.enabled());
        assert_eq!(cloud_watch.log_group(), Some("/msk/connect"));
    }
}
