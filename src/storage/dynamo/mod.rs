//! DynamoDB store.
//!
//! Thin wrapper over `GetItem`, `Query`, `PutItem` and `DeleteItem`. Queries
//! read a single page: when DynamoDB returns `LastEvaluatedKey` the page is
//! flagged as truncated and the remainder is not fetched.

mod convert;

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use super::{Key, KeyQuery, KeyValueStore, QueryPage, Result, StoreError};
use crate::config::StoreConfig;
use crate::record::Record;

pub use convert::{from_attribute_value, from_item, to_attribute_value, to_item};

/// DynamoDB implementation of [`KeyValueStore`].
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Build a client from the shared AWS config for the configured profile.
    ///
    /// Credentials are resolved lazily on the first call.
    pub async fn connect(config: &StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&config.profile)
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        info!(
            profile = %config.profile,
            region = %config.region,
            "Connected to DynamoDB"
        );

        Self {
            client: Client::new(&sdk_config),
        }
    }
}

fn unavailable<E>(operation: &str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::Unavailable(format!(
        "failed to {}: {}",
        operation,
        DisplayErrorContext(err)
    ))
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Record>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_item(key.clone())))
            .send()
            .await
            .map_err(|e| unavailable("get item", e))?;

        debug!(table = %table, found = output.item.is_some(), "DynamoDB get_item");
        output.item.map(from_item).transpose()
    }

    async fn query(&self, query: &KeyQuery) -> Result<QueryPage> {
        let values: HashMap<String, AttributeValue> = query
            .expression_attribute_values()
            .into_iter()
            .map(|(k, v)| (k, to_attribute_value(v)))
            .collect();

        let output = self
            .client
            .query()
            .table_name(&query.table)
            .set_index_name(query.index.clone())
            .key_condition_expression(query.key_condition_expression())
            .set_expression_attribute_names(Some(query.expression_attribute_names()))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| unavailable("query", e))?;

        let truncated = output.last_evaluated_key.is_some();
        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(from_item)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            table = %query.table,
            index = ?query.index,
            count = items.len(),
            truncated,
            "DynamoDB query"
        );
        Ok(QueryPage { items, truncated })
    }

    async fn put_item(&self, table: &str, item: Record) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(item)))
            .send()
            .await
            .map_err(|e| unavailable("put item", e))?;

        debug!(table = %table, "DynamoDB put_item");
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_item(key.clone())))
            .send()
            .await
            .map_err(|e| unavailable("delete item", e))?;

        debug!(table = %table, "DynamoDB delete_item");
        Ok(())
    }
}
