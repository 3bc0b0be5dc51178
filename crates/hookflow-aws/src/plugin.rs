//! MSK Connect custom plugin registration

use crate::error::{AwsError, Result};
use crate::settings::{self, AwsSettings, DEFAULT_PLUGIN_FILE_KEY, DEFAULT_PLUGIN_NAME};
use async_trait::async_trait;
use aws_sdk_kafkaconnect::types::{CustomPluginContentType, CustomPluginLocation, S3Location};
use hookflow_core::{BackendGateway, Handle, Initiated, Observation, Outputs};

pub const PLUGIN_OUTPUT: &str = "PluginArn";

/// Parameters of one `CreateCustomPlugin` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    pub name: String,
    pub bucket_arn: String,
    pub file_key: String,
}

impl PluginRequest {
    /// Resolve request parameters from event properties and settings
    pub fn resolve(properties: &Outputs, settings: &AwsSettings) -> Result<Self> {
        Ok(Self {
            name: settings::or_default(properties, "PluginName", DEFAULT_PLUGIN_NAME),
            bucket_arn: settings::required(
                properties,
                "BucketArn",
                settings.bucket_arn.as_deref(),
                "BUCKET_ARN",
            )?,
            file_key: settings::or_default(properties, "FileKey", DEFAULT_PLUGIN_FILE_KEY),
        })
    }

    fn location(&self) -> Result<CustomPluginLocation> {
        let s3 = S3Location::builder()
            .bucket_arn(&self.bucket_arn)
            .file_key(&self.file_key)
            .build()?;
        Ok(CustomPluginLocation::builder().s3_location(s3).build())
    }
}

/// Registers a ZIP archive in S3 as a custom plugin and waits for it to
/// become `ACTIVE`
pub struct PluginRegistryGateway {
    client: aws_sdk_kafkaconnect::Client,
    settings: AwsSettings,
}

impl PluginRegistryGateway {
    pub fn new(client: aws_sdk_kafkaconnect::Client, settings: AwsSettings) -> Self {
        Self { client, settings }
    }

    pub fn from_conf(config: &aws_config::SdkConfig, settings: AwsSettings) -> Self {
        Self::new(aws_sdk_kafkaconnect::Client::new(config), settings)
    }

    async fn create(&self, request: &PluginRequest) -> Result<String> {
        tracing::info!(
            name = %request.name,
            bucket = %request.bucket_arn,
            key = %request.file_key,
            "Creating custom plugin"
        );

        let output = self
            .client
            .create_custom_plugin()
            .name(&request.name)
            .content_type(CustomPluginContentType::Zip)
            .location(request.location()?)
            .send()
            .await
            .map_err(AwsError::kafka_connect)?;

        output
            .custom_plugin_arn()
            .map(str::to_string)
            .ok_or_else(|| AwsError::UnexpectedResponse("CreateCustomPlugin returned no ARN".to_string()))
    }
}

#[async_trait]
impl BackendGateway for PluginRegistryGateway {
    fn name(&self) -> &str {
        "msk-connect-plugin"
    }

    async fn initiate(&self, properties: &Outputs) -> hookflow_core::Result<Initiated> {
        let request = PluginRequest::resolve(properties, &self.settings)?;
        let arn = self.create(&request).await?;

        Ok(Initiated::with_handle(Handle::new(arn.clone())).with_output(PLUGIN_OUTPUT, arn.into()))
    }

    async fn describe(&self, handle: &Handle) -> hookflow_core::Result<Observation> {
        let output = self
            .client
            .describe_custom_plugin()
            .custom_plugin_arn(handle.as_str())
            .send()
            .await
            .map_err(AwsError::kafka_connect)?;

        let state = output
            .custom_plugin_state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default();
        let mut observation = Observation::new(state);
        if let Some(message) = output.state_description().and_then(|d| d.message()) {
            observation = observation.with_detail(message);
        }
        Ok(observation)
    }

    fn supports_teardown(&self) -> bool {
        true
    }

    async fn teardown(&self, handle: &Handle) -> hookflow_core::Result<()> {
        tracing::info!(plugin = %handle, "Deleting custom plugin");
        self.client
            .delete_custom_plugin()
            .custom_plugin_arn(handle.as_str())
            .send()
            .await
            .map_err(AwsError::kafka_connect)?;
        Ok(())
    }
}
