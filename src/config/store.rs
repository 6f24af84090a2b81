//! Store configuration types.

use serde::Deserialize;

/// Store backend discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    Dynamo,
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend discriminator.
    #[serde(rename = "type")]
    pub store_type: StoreType,
    /// AWS shared-config profile used for credentials.
    pub profile: String,
    /// AWS region.
    pub region: String,
    /// Endpoint override (DynamoDB Local, LocalStack).
    pub endpoint_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Dynamo,
            profile: "default".to_string(),
            region: "ap-southeast-1".to_string(),
            endpoint_url: None,
        }
    }
}
