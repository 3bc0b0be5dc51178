//! AWS gateway error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("Missing setting: set {env} or the {property} resource property")]
    MissingSetting {
        env: &'static str,
        property: &'static str,
    },

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("MSK API error: {0}")]
    Kafka(String),

    #[error("MSK Connect API error: {0}")]
    KafkaConnect(String),

    #[error("Request build error: {0}")]
    Build(#[from] aws_sdk_kafkaconnect::error::BuildError),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl AwsError {
    pub(crate) fn kafka<E>(err: E) -> Self
    where
        E: std::error::Error,
    {
        AwsError::Kafka(aws_sdk_kafka::error::DisplayErrorContext(err).to_string())
    }

    pub(crate) fn kafka_connect<E>(err: E) -> Self
    where
        E: std::error::Error,
    {
        AwsError::KafkaConnect(aws_sdk_kafkaconnect::error::DisplayErrorContext(err).to_string())
    }
}

impl From<AwsError> for hookflow_core::ProvisionError {
    fn from(err: AwsError) -> Self {
        hookflow_core::ProvisionError::Api(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
