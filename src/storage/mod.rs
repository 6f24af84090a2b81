//! Store adapters.
//!
//! The gateway talks to the key-value store through [`KeyValueStore`]: point
//! read, key-condition query, put and delete. Two implementations:
//! - `DynamoStore` (feature: dynamo) - AWS DynamoDB
//! - [`MemoryStore`] - in-process tables, for local runs and as a test spy
//!
//! Calls are single round trips. There is no retry layer; failures surface
//! to the caller as [`StoreError::Unavailable`].

#[cfg(feature = "dynamo")]
pub mod dynamo;
pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{StoreConfig, StoreType};
use crate::record::{Record, Value};

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoStore;
pub use memory::{MemoryStore, StoreStats};

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Primary key of an item: key attribute name to value.
pub type Key = Record;

/// Equality condition on one key attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub attribute: String,
    pub value: Value,
}

impl KeyCondition {
    pub fn new(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Key-condition query against a table or one of its secondary indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyQuery {
    /// Physical table name.
    pub table: String,
    /// Secondary index; `None` queries the table's primary key.
    pub index: Option<String>,
    pub hash: KeyCondition,
    pub range: Option<KeyCondition>,
}

impl KeyQuery {
    pub const HASH_NAME: &'static str = "#hk";
    pub const HASH_VALUE: &'static str = ":hashVal";
    pub const RANGE_NAME: &'static str = "#rk";
    pub const RANGE_VALUE: &'static str = ":rangeVal";

    /// `#hk = :hashVal`, with `AND #rk = :rangeVal` when the range is bound.
    pub fn key_condition_expression(&self) -> String {
        let mut expression = format!("{} = {}", Self::HASH_NAME, Self::HASH_VALUE);
        if self.range.is_some() {
            expression.push_str(&format!(" AND {} = {}", Self::RANGE_NAME, Self::RANGE_VALUE));
        }
        expression
    }

    pub fn expression_attribute_names(&self) -> HashMap<String, String> {
        let mut names = HashMap::from([(Self::HASH_NAME.to_string(), self.hash.attribute.clone())]);
        if let Some(range) = &self.range {
            names.insert(Self::RANGE_NAME.to_string(), range.attribute.clone());
        }
        names
    }

    pub fn expression_attribute_values(&self) -> HashMap<String, Value> {
        let mut values = HashMap::from([(Self::HASH_VALUE.to_string(), self.hash.value.clone())]);
        if let Some(range) = &self.range {
            values.insert(Self::RANGE_VALUE.to_string(), range.value.clone());
        }
        values
    }

    /// Conditions as `(attribute, value)` pairs.
    pub fn conditions(&self) -> Vec<(&str, &Value)> {
        std::iter::once(&self.hash)
            .chain(self.range.as_ref())
            .map(|c| (c.attribute.as_str(), &c.value))
            .collect()
    }
}

/// First page of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Record>,
    /// The store reported more results past this page. They are not fetched.
    pub truncated: bool,
}

/// Key-value store operations used by the gateway.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a single item by its full primary key.
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Record>>;

    /// Run a key-condition query and return the first page of results.
    async fn query(&self, query: &KeyQuery) -> Result<QueryPage>;

    /// Store an item, replacing any existing item with the same key.
    async fn put_item(&self, table: &str, item: Record) -> Result<()>;

    /// Remove the item with the given key. Absent items are not an error.
    async fn delete_item(&self, table: &str, key: &Key) -> Result<()>;
}

/// Initialize the store backend named by configuration.
///
/// The in-memory backend gets one empty table per catalog entry.
pub async fn init_store(
    config: &StoreConfig,
    catalog: &Catalog,
) -> std::result::Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    match config.store_type {
        #[cfg(feature = "dynamo")]
        StoreType::Dynamo => {
            info!(
                profile = %config.profile,
                region = %config.region,
                endpoint = ?config.endpoint_url,
                "Store: dynamo"
            );
            let store = DynamoStore::connect(config).await;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "dynamo"))]
        StoreType::Dynamo => Err("DynamoDB store requested but 'dynamo' feature is not enabled".into()),
        StoreType::Memory => {
            info!(tables = catalog.table_count(), "Store: memory");
            Ok(Arc::new(MemoryStore::from_catalog(catalog)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_condition_hash_only() {
        let query = KeyQuery {
            table: "staging-users".to_string(),
            index: Some("email_index".to_string()),
            hash: KeyCondition::new("email", "a@example.com"),
            range: None,
        };

        assert_eq!(query.key_condition_expression(), "#hk = :hashVal");
        assert_eq!(query.expression_attribute_names()["#hk"], "email");
        assert_eq!(query.expression_attribute_values().len(), 1);
        assert_eq!(query.conditions(), vec![("email", &Value::from("a@example.com"))]);
    }

    #[tokio::test]
    async fn test_init_store_memory_registers_catalog_tables() {
        let config = crate::config::Config::for_test();
        let catalog = Catalog::builtin().unwrap();
        let store = init_store(&config.store, &catalog).await.unwrap();

        let mut item = Record::new();
        item.insert("onboard_id", "o-1");
        store
            .put_item("non-prod-uat-onboarding-progress", item.clone())
            .await
            .unwrap();

        let mut key = Key::new();
        key.insert("onboard_id", "o-1");
        let found = store
            .get_item("non-prod-uat-onboarding-progress", &key)
            .await
            .unwrap();
        assert_eq!(found, Some(item));
    }

    #[test]
    fn test_key_condition_with_range() {
        let query = KeyQuery {
            table: "staging-progress".to_string(),
            index: Some("phone_number_device_id".to_string()),
            hash: KeyCondition::new("phone_number", "6591234567"),
            range: Some(KeyCondition::new("device_id", "dev-1")),
        };

        assert_eq!(
            query.key_condition_expression(),
            "#hk = :hashVal AND #rk = :rangeVal"
        );
        let names = query.expression_attribute_names();
        assert_eq!(names["#rk"], "device_id");
        let values = query.expression_attribute_values();
        assert_eq!(values[":rangeVal"], Value::from("dev-1"));
        assert_eq!(query.conditions().len(), 2);
    }
}
