//! Gateway service.
//!
//! Resolves requests against the catalog, runs them through the translator
//! and the delete guard, and executes them on the store. Stateless apart from
//! the shared catalog and store handle; every call is independent.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError, Environment, InvalidEnvironment};
use crate::guard::{self, InvalidConfirmationToken};
use crate::query::{self, MissingRequiredKey, QueryValues, StoreOperation};
use crate::record::{NotAnObject, Record};
use crate::storage::{Key, KeyValueStore, StoreError};

/// Errors surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    InvalidEnvironment(#[from] InvalidEnvironment),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    MissingRequiredKey(#[from] MissingRequiredKey),

    #[error("item must include key attribute {0}")]
    MissingKeyAttribute(String),

    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("invalid primary key: expected {expected}, got {actual}")]
    PrimaryKeyMismatch { expected: String, actual: String },

    #[error(transparent)]
    InvalidConfirmationToken(#[from] InvalidConfirmationToken),

    #[error("Invalid request body: {0}")]
    MalformedRequest(String),

    #[error("{0}")]
    Serialization(String),

    #[error("{0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => GatewayError::StoreUnavailable(msg),
            StoreError::Serialization(msg) => GatewayError::Serialization(msg),
        }
    }
}

impl From<NotAnObject> for GatewayError {
    fn from(err: NotAnObject) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// A lookup by key values on one index of a table.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub environment: Environment,
    pub table: String,
    /// Empty selects the table's primary key.
    pub index_name: String,
    pub values: QueryValues,
}

/// Items answering a query (first page only).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub count: usize,
    pub items: Vec<Record>,
}

/// A guarded delete by primary key.
#[derive(Debug, Clone)]
pub struct DeleteParams {
    pub environment: Environment,
    pub table: String,
    pub primary_key: String,
    pub primary_value: String,
    pub confirmation_token: String,
}

/// Query/update/delete over catalog tables.
pub struct Gateway {
    catalog: Arc<Catalog>,
    store: Arc<dyn KeyValueStore>,
}

impl Gateway {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run a query, preferring a point read for primary-key lookups on
    /// tables without a sort key.
    pub async fn execute_query(&self, params: &QueryParams) -> Result<QueryOutcome> {
        let table = self.catalog.lookup_table(params.environment, &params.table)?;
        let index = self
            .catalog
            .lookup_index(params.environment, &params.table, &params.index_name)?;

        let items: Vec<Record> = match query::translate(table, index, &params.values)? {
            StoreOperation::PointRead { table, key } => {
                self.store.get_item(&table, &key).await?.into_iter().collect()
            }
            StoreOperation::Query(key_query) => {
                let page = self.store.query(&key_query).await?;
                if page.truncated {
                    warn!(
                        environment = %params.environment,
                        table = %params.table,
                        index = %params.index_name,
                        returned = page.items.len(),
                        "Query has more results than one page; returning the first page only"
                    );
                }
                page.items
            }
        };

        info!(
            environment = %params.environment,
            table = %params.table,
            index = %params.index_name,
            count = items.len(),
            "Query executed"
        );

        Ok(QueryOutcome {
            count: items.len(),
            items,
        })
    }

    /// Replace the stored item that shares `item`'s primary key.
    pub async fn update_item(
        &self,
        environment: Environment,
        table_name: &str,
        item: Record,
    ) -> Result<String> {
        let table = self.catalog.lookup_table(environment, table_name)?;

        for attr in table.key_attributes() {
            if item.get(attr).map_or(true, |v| v.is_null()) {
                return Err(GatewayError::MissingKeyAttribute(attr.to_string()));
            }
        }

        self.store.put_item(&table.name, item).await?;

        info!(environment = %environment, table = %table_name, "Item updated");
        Ok(format!("Successfully updated item in {}", table_name))
    }

    /// Delete one item after checking the table, key name and confirmation
    /// token. Nothing reaches the store unless every check passes.
    pub async fn delete_item(&self, params: &DeleteParams) -> Result<String> {
        if params.table.is_empty() || params.primary_key.is_empty() || params.primary_value.is_empty() {
            return Err(GatewayError::MissingFields(
                "table, primaryKey, and primaryValue are required".to_string(),
            ));
        }

        let table = self.catalog.lookup_table(params.environment, &params.table)?;

        if table.primary_key != params.primary_key {
            return Err(GatewayError::PrimaryKeyMismatch {
                expected: table.primary_key.clone(),
                actual: params.primary_key.clone(),
            });
        }

        guard::verify(
            params.environment.as_str(),
            &params.table,
            &params.primary_value,
            &params.confirmation_token,
        )?;

        let mut key = Key::new();
        key.insert(params.primary_key.clone(), params.primary_value.clone());
        self.store.delete_item(&table.name, &key).await?;

        info!(
            environment = %params.environment,
            table = %params.table,
            primary_key = %params.primary_key,
            "Item deleted"
        );
        Ok(format!(
            "Successfully deleted item with {}={} from {}",
            params.primary_key, params.primary_value, params.table
        ))
    }
}
