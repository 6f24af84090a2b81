//! Table catalog.
//!
//! Read-only registry of the tables each environment exposes, with the key
//! structure and secondary indexes of each. Built once at startup from a
//! [`CatalogDefinition`] (YAML file or the built-in default) and shared
//! immutably by every request.
//!
//! Every table carries exactly one primary index entry: the one with an empty
//! name, whose hash key is the table's primary key. Construction enforces this,
//! so `lookup_index(env, table, "")` always resolves for a known table.

mod builtin;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Deployment environment selecting which physical tables are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Staging,
    Production,
}

impl Environment {
    /// All environments, in display order.
    pub const ALL: [Environment; 2] = [Environment::Staging, Environment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn slot(self) -> usize {
        match self {
            Environment::Staging => 0,
            Environment::Production => 1,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid environment: {0}")]
pub struct InvalidEnvironment(pub String);

impl FromStr for Environment {
    type Err = InvalidEnvironment;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| InvalidEnvironment(s.to_string()))
    }
}

/// One queryable access path on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    /// Index name; empty for the table's own primary key.
    #[serde(default)]
    pub name: String,
    pub display_name: String,
    pub hash_key: String,
    #[serde(default, with = "empty_as_none")]
    pub range_key: Option<String>,
}

impl IndexDescriptor {
    pub fn is_primary(&self) -> bool {
        self.name.is_empty()
    }
}

/// Static metadata for one logical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    /// Physical table name in the store.
    pub name: String,
    pub display_name: String,
    pub primary_key: String,
    #[serde(default, with = "empty_as_none")]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    /// The primary-key access path. Always `Some` for tables held by a [`Catalog`].
    pub fn primary_index(&self) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|idx| idx.is_primary())
    }

    /// Find an index by name; the empty name selects the primary index.
    pub fn index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes.iter().find(|idx| idx.name == name)
    }

    /// Attribute names that make up the table's primary key.
    pub fn key_attributes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_key.as_str()).chain(self.sort_key.as_deref())
    }

    fn normalize(&mut self, logical: &str) -> Result<()> {
        let primaries: Vec<usize> = self
            .indexes
            .iter()
            .enumerate()
            .filter(|(_, idx)| idx.is_primary())
            .map(|(i, _)| i)
            .collect();

        match primaries.as_slice() {
            [] => {
                self.indexes.insert(
                    0,
                    IndexDescriptor {
                        name: String::new(),
                        display_name: format!("{} (Primary)", self.primary_key),
                        hash_key: self.primary_key.clone(),
                        range_key: self.sort_key.clone(),
                    },
                );
                Ok(())
            }
            [i] => {
                let primary = &self.indexes[*i];
                if primary.hash_key != self.primary_key {
                    return Err(CatalogError::PrimaryIndexMismatch {
                        table: logical.to_string(),
                        expected: self.primary_key.clone(),
                        actual: primary.hash_key.clone(),
                    });
                }
                if primary.range_key != self.sort_key {
                    return Err(CatalogError::PrimaryRangeKeyMismatch {
                        table: logical.to_string(),
                        expected: self.sort_key.as_deref().unwrap_or("none").to_string(),
                        actual: primary.range_key.as_deref().unwrap_or("none").to_string(),
                    });
                }
                Ok(())
            }
            _ => Err(CatalogError::DuplicatePrimaryIndex(logical.to_string())),
        }
    }
}

/// Catalog errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("table {table} not found for environment {environment}")]
    UnknownTable {
        environment: Environment,
        table: String,
    },

    #[error("index {index} not found for table {table}")]
    UnknownIndex { table: String, index: String },

    #[error("table {0} declares more than one primary index")]
    DuplicatePrimaryIndex(String),

    #[error("primary index of table {table} must use key {expected}, found {actual}")]
    PrimaryIndexMismatch {
        table: String,
        expected: String,
        actual: String,
    },

    #[error("primary index of table {table} must use range key {expected}, found {actual}")]
    PrimaryRangeKeyMismatch {
        table: String,
        expected: String,
        actual: String,
    },

    #[error("failed to load catalog: {0}")]
    Load(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Serialized form of a catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub environments: BTreeMap<Environment, BTreeMap<String, TableDescriptor>>,
}

/// Name-keyed tables of one environment.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TableRegistry {
    tables: HashMap<String, TableDescriptor>,
}

impl TableRegistry {
    pub fn get(&self, table: &str) -> Option<&TableDescriptor> {
        self.tables.get(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TableDescriptor)> {
        self.tables.iter()
    }
}

/// Immutable environment → table → descriptor registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    registries: [TableRegistry; 2],
}

impl Catalog {
    /// Build a catalog, enforcing the primary index invariant on every table.
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self> {
        let mut catalog = Catalog::default();
        for (env, tables) in definition.environments {
            let registry = &mut catalog.registries[env.slot()];
            for (logical, mut table) in tables {
                table.normalize(&logical)?;
                registry.tables.insert(logical, table);
            }
        }
        Ok(catalog)
    }

    /// Parse a YAML catalog definition.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let definition: CatalogDefinition =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::Load(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Load a YAML catalog definition from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Load(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_yaml(&content)?;
        info!(path = %path.display(), tables = catalog.table_count(), "Loaded catalog");
        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_definition(builtin::definition())
    }

    pub fn tables(&self, env: Environment) -> &TableRegistry {
        &self.registries[env.slot()]
    }

    pub fn lookup_table(&self, env: Environment, table: &str) -> Result<&TableDescriptor> {
        self.tables(env)
            .get(table)
            .ok_or_else(|| CatalogError::UnknownTable {
                environment: env,
                table: table.to_string(),
            })
    }

    pub fn lookup_index(
        &self,
        env: Environment,
        table: &str,
        index: &str,
    ) -> Result<&IndexDescriptor> {
        self.lookup_table(env, table)?
            .index(index)
            .ok_or_else(|| CatalogError::UnknownIndex {
                table: table.to_string(),
                index: index.to_string(),
            })
    }

    /// Total number of tables across all environments.
    pub fn table_count(&self) -> usize {
        self.registries.iter().map(TableRegistry::len).sum()
    }

    /// Catalog dump served by `GET /api/tables`.
    pub fn snapshot(&self) -> CatalogSnapshot<'_> {
        CatalogSnapshot {
            environments: Environment::ALL.iter().map(Environment::as_str).collect(),
            tables: Environment::ALL
                .iter()
                .map(|env| (env.as_str(), self.tables(*env)))
                .collect(),
        }
    }
}

/// Wire shape of the catalog dump.
#[derive(Debug, Serialize)]
pub struct CatalogSnapshot<'a> {
    pub environments: Vec<&'static str>,
    pub tables: BTreeMap<&'static str, &'a TableRegistry>,
}

/// Optional attribute names travel as `""` when absent.
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()))
    }
}
