//! In-memory store.
//!
//! Tables live in process memory and are addressed by physical name. Each
//! table knows its key attributes so puts replace rather than duplicate.
//! Every trait call is counted, which lets tests assert which store path a
//! request took (point read vs query) and that guarded deletes never reach
//! the store.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Key, KeyQuery, KeyValueStore, QueryPage, Result, StoreError};
use crate::catalog::{Catalog, Environment};
use crate::record::{Record, Value};

/// Call counters, one per store operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub point_reads: usize,
    pub queries: usize,
    pub puts: usize,
    pub deletes: usize,
}

#[derive(Default)]
struct Counters {
    point_reads: AtomicUsize,
    queries: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

struct MemoryTable {
    key_attributes: Vec<String>,
    items: Vec<Record>,
}

impl MemoryTable {
    fn key_of<'a>(&self, item: &'a Record) -> Result<Vec<(&str, &'a Value)>> {
        self.key_attributes
            .iter()
            .map(|attr| match item.get(attr) {
                Some(value) if !value.is_null() => Ok((attr.as_str(), value)),
                _ => Err(StoreError::Serialization(format!(
                    "item is missing key attribute {}",
                    attr
                ))),
            })
            .collect()
    }

    /// Key conditions for a point operation. The key must name exactly the
    /// table's key attributes, as DynamoDB requires for `GetItem`/`DeleteItem`.
    fn full_key<'a>(&self, key: &'a Key) -> Result<Vec<(&'a str, &'a Value)>> {
        let complete = key.len() == self.key_attributes.len()
            && self.key_attributes.iter().all(|attr| key.get(attr).is_some());
        if !complete {
            let supplied: Vec<&str> = key.iter().map(|(k, _)| k.as_str()).collect();
            return Err(StoreError::Serialization(format!(
                "key does not match the table key schema: expected {}, got {}",
                self.key_attributes.join(", "),
                supplied.join(", ")
            )));
        }
        Ok(key.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
    page_limit: Option<usize>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One empty table per catalog entry, in every environment.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut tables = HashMap::new();
        for env in Environment::ALL {
            for (_, table) in catalog.tables(env).iter() {
                tables.insert(
                    table.name.clone(),
                    MemoryTable {
                        key_attributes: table.key_attributes().map(str::to_string).collect(),
                        items: Vec::new(),
                    },
                );
            }
        }
        Self {
            tables: RwLock::new(tables),
            ..Self::default()
        }
    }

    /// Register a table keyed by the given attributes.
    pub fn with_table(mut self, name: impl Into<String>, key_attributes: &[&str]) -> Self {
        let table = MemoryTable {
            key_attributes: key_attributes.iter().map(|a| a.to_string()).collect(),
            items: Vec::new(),
        };
        self.tables.get_mut().insert(name.into(), table);
        self
    }

    /// Cap query pages at `limit` items, flagging the page as truncated.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    /// Insert an item without counting it as a put.
    pub async fn seed(&self, table: &str, item: Record) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;
        upsert(table, item)
    }

    /// Snapshot of a table's items, in insertion order.
    pub async fn items(&self, table: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.items.clone())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            point_reads: self.counters.point_reads.load(Ordering::SeqCst),
            queries: self.counters.queries.load(Ordering::SeqCst),
            puts: self.counters.puts.load(Ordering::SeqCst),
            deletes: self.counters.deletes.load(Ordering::SeqCst),
        }
    }
}

fn missing_table(table: &str) -> StoreError {
    StoreError::Unavailable(format!("Requested resource not found: table {}", table))
}

fn upsert(table: &mut MemoryTable, item: Record) -> Result<()> {
    let position = {
        let key = table.key_of(&item)?;
        table.items.iter().position(|existing| existing.matches(&key))
    };
    match position {
        Some(i) => table.items[i] = item,
        None => table.items.push(item),
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, table: &str, key: &Key) -> Result<Option<Record>> {
        self.counters.point_reads.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read().await;
        let table = tables.get(table).ok_or_else(|| missing_table(table))?;

        let conditions = table.full_key(key)?;
        Ok(table
            .items
            .iter()
            .find(|item| item.matches(&conditions))
            .cloned())
    }

    async fn query(&self, query: &KeyQuery) -> Result<QueryPage> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read().await;
        let table = tables
            .get(&query.table)
            .ok_or_else(|| missing_table(&query.table))?;

        let conditions = query.conditions();
        let mut items: Vec<Record> = table
            .items
            .iter()
            .filter(|item| item.matches(&conditions))
            .cloned()
            .collect();

        let truncated = match self.page_limit {
            Some(limit) if items.len() > limit => {
                items.truncate(limit);
                true
            }
            _ => false,
        };

        debug!(table = %query.table, index = ?query.index, count = items.len(), "Memory query");
        Ok(QueryPage { items, truncated })
    }

    async fn put_item(&self, table: &str, item: Record) -> Result<()> {
        self.counters.puts.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;
        upsert(table, item)
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<()> {
        self.counters.deletes.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        let conditions = table.full_key(key)?;
        table.items.retain(|item| !item.matches(&conditions));
        Ok(())
    }
}
