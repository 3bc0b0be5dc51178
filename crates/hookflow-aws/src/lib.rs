//! Amazon MSK / MSK Connect gateways for hookflow
//!
//! - [`BrokerLookupGateway`]: `GetBootstrapBrokers`, synchronous
//! - [`PluginRegistryGateway`]: `CreateCustomPlugin` / `DescribeCustomPlugin` / `DeleteCustomPlugin`
//! - [`ConnectorRegistryGateway`]: `CreateConnector` / `DescribeConnector`
//!
//! Credentials and region are resolved by `aws-config`; everything else comes
//! from [`AwsSettings`].

pub mod broker;
pub mod connector;
pub mod error;
pub mod plugin;
pub mod settings;

pub use broker::BrokerLookupGateway;
pub use connector::{ConnectorRegistryGateway, ConnectorRequest};
pub use error::{AwsError, Result};
pub use plugin::{PluginRegistryGateway, PluginRequest};
pub use settings::AwsSettings;

use hookflow_core::{BackendGateway, ResourceKind};

/// Load the shared AWS configuration from the environment
pub async fn load_sdk_config() -> aws_config::SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
}

/// Gateway for a resource kind
pub fn gateway_for(
    kind: ResourceKind,
    config: &aws_config::SdkConfig,
    settings: AwsSettings,
) -> Box<dyn BackendGateway> {
    match kind {
        ResourceKind::BrokerLookup => Box::new(BrokerLookupGateway::from_conf(config, &settings)),
        ResourceKind::PluginRegistry => Box::new(PluginRegistryGateway::from_conf(config, settings)),
        ResourceKind::ConnectorRegistry => {
            Box::new(ConnectorRegistryGateway::from_conf(config, settings))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> aws_config::SdkConfig {
        aws_config::SdkConfig::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new("us-east-1"))
            .build()
    }

    #[tokio::test]
    async fn test_gateway_for_every_kind() {
        let config = offline_config();

        let broker = gateway_for(ResourceKind::BrokerLookup, &config, AwsSettings::default());
        assert_eq!(broker.name(), "msk-broker-lookup");
        assert!(!broker.supports_teardown());

        let plugin = gateway_for(ResourceKind::PluginRegistry, &config, AwsSettings::default());
        assert_eq!(plugin.name(), "msk-connect-plugin");
        assert!(plugin.supports_teardown());

        // コネクタは削除時にそのまま残す
        let connector = gateway_for(ResourceKind::ConnectorRegistry, &config, AwsSettings::default());
        assert_eq!(connector.name(), "msk-connect-connector");
        assert!(!connector.supports_teardown());
    }

    #[tokio::test]
    async fn test_missing_settings_fail_before_any_call() {
        let config = offline_config();

        let broker = gateway_for(ResourceKind::BrokerLookup, &config, AwsSettings::default());
        let err = broker.initiate(&hookflow_core::Outputs::new()).await.unwrap_err();
        assert!(matches!(err, hookflow_core::ProvisionError::Api(_)));
        assert!(err.to_string().contains("MSK_ENDPOINT"));

        let plugin = gateway_for(ResourceKind::PluginRegistry, &config, AwsSettings::default());
        let err = plugin.initiate(&hookflow_core::Outputs::new()).await.unwrap_err();
        assert!(err.to_string().contains("BUCKET_ARN"));
    }
}
