//! Backend settings
//!
//! Deployment-wide values come from the environment. A few of them can be
//! overridden per event through `ResourceProperties`.

use crate::error::{AwsError, Result};
use hookflow_core::Outputs;

pub const DEFAULT_PLUGIN_NAME: &str = "msks3";
pub const DEFAULT_PLUGIN_FILE_KEY: &str = "/tmp/kafka-connect.zip";
pub const DEFAULT_CONNECTOR_NAME: &str = "kafka-connect-s3-connector";
pub const DEFAULT_TOPICS: &str = "salesorder";

/// Settings read from the function environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    /// `MSK_ENDPOINT`: cluster ARN used for broker lookups
    pub msk_endpoint: Option<String>,
    /// `PLUGIN_ARN`: custom plugin the connector runs
    pub plugin_arn: Option<String>,
    /// `BUCKET_ARN`: bucket holding the plugin archive
    pub bucket_arn: Option<String>,
    /// `BUCKET_NAME`: sink bucket of the connector
    pub bucket_name: Option<String>,
    /// `REGION`: sink bucket region
    pub region: Option<String>,
    /// `SUBNET_A`, `SUBNET_B`
    pub subnets: Vec<String>,
    /// `SECURITY_GROUP`
    pub security_group: Option<String>,
    /// `ROLE_NAME`: connector service execution role ARN
    pub role_name: Option<String>,
    /// `LOG_GROUP`: connector worker log group
    pub log_group: Option<String>,
}

impl AwsSettings {
    /// Read settings from environment variables
    ///
    /// Nothing is required here; each gateway checks what it needs when it runs.
    pub fn from_env() -> Self {
        Self {
            msk_endpoint: env_var("MSK_ENDPOINT"),
            plugin_arn: env_var("PLUGIN_ARN"),
            bucket_arn: env_var("BUCKET_ARN"),
            bucket_name: env_var("BUCKET_NAME"),
            region: env_var("REGION"),
            subnets: ["SUBNET_A", "SUBNET_B"]
                .into_iter()
                .filter_map(env_var)
                .collect(),
            security_group: env_var("SECURITY_GROUP"),
            role_name: env_var("ROLE_NAME"),
            log_group: env_var("LOG_GROUP"),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// A string resource property, if present and non-empty
pub(crate) fn property<'a>(properties: &'a Outputs, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Resolve a value from a resource property, falling back to a setting
pub(crate) fn required(
    properties: &Outputs,
    property_key: &'static str,
    setting: Option<&str>,
    env: &'static str,
) -> Result<String> {
    property(properties, property_key)
        .or(setting)
        .map(str::to_string)
        .ok_or(AwsError::MissingSetting {
            env,
            property: property_key,
        })
}

/// Like [`required`], with a built-in default instead of an error
pub(crate) fn or_default(properties: &Outputs, property_key: &str, default: &str) -> String {
    property(properties, property_key)
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    const ALL_VARS: [&str; 10] = [
        "MSK_ENDPOINT",
        "PLUGIN_ARN",
        "BUCKET_ARN",
        "BUCKET_NAME",
        "REGION",
        "SUBNET_A",
        "SUBNET_B",
        "SECURITY_GROUP",
        "ROLE_NAME",
        "LOG_GROUP",
    ];

    #[test]
    #[serial]
    fn test_from_env() {
        let settings = temp_env::with_vars(
            [
                ("MSK_ENDPOINT", Some("arn:aws:kafka:us-east-1:1:cluster/msk/abc")),
                ("PLUGIN_ARN", None),
                ("BUCKET_ARN", Some("arn:aws:s3:::plugins")),
                ("BUCKET_NAME", None),
                ("REGION", Some("us-east-1")),
                ("SUBNET_A", Some("subnet-a")),
                ("SUBNET_B", Some("subnet-b")),
                ("SECURITY_GROUP", Some("sg-1")),
                ("ROLE_NAME", None),
                ("LOG_GROUP", Some("")),
            ],
            AwsSettings::from_env,
        );

        assert_eq!(
            settings.msk_endpoint.as_deref(),
            Some("arn:aws:kafka:us-east-1:1:cluster/msk/abc")
        );
        assert_eq!(settings.bucket_arn.as_deref(), Some("arn:aws:s3:::plugins"));
        assert_eq!(settings.subnets, vec!["subnet-a", "subnet-b"]);
        assert!(settings.plugin_arn.is_none());
        // 空文字は未設定として扱う
        assert!(settings.log_group.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_empty() {
        let settings = temp_env::with_vars_unset(ALL_VARS, AwsSettings::from_env);
        assert_eq!(settings, AwsSettings::default());
    }

    #[test]
    fn test_property_overrides_setting() {
        let properties = json!({ "ClusterArn": "arn:from-event" });
        let properties = properties.as_object().unwrap();

        let value = required(properties, "ClusterArn", Some("arn:from-env"), "MSK_ENDPOINT").unwrap();
        assert_eq!(value, "arn:from-event");

        let value = required(&Outputs::new(), "ClusterArn", Some("arn:from-env"), "MSK_ENDPOINT").unwrap();
        assert_eq!(value, "arn:from-env");
    }

    #[test]
    fn test_missing_setting_names_both_sources() {
        let err = required(&Outputs::new(), "ClusterArn", None, "MSK_ENDPOINT").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("MSK_ENDPOINT"));
        assert!(message.contains("ClusterArn"));
    }

    #[test]
    fn test_or_default_ignores_non_string_values() {
        let properties = json!({ "PluginName": 42, "FileKey": "" });
        let properties = properties.as_object().unwrap();

        assert_eq!(or_default(properties, "PluginName", DEFAULT_PLUGIN_NAME), "msks3");
        assert_eq!(
            or_default(properties, "FileKey", DEFAULT_PLUGIN_FILE_KEY),
            "/tmp/kafka-connect.zip"
        );
    }
}
