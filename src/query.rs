//! Query translation.
//!
//! Turns a resolved index plus caller-supplied key values into the store
//! operation that answers it. A primary-key lookup on a table without a sort
//! key becomes a point read; everything else becomes a key-condition query
//! with the range key bound only when the caller supplied it.

use std::collections::HashMap;

use thiserror::Error;

use crate::catalog::{IndexDescriptor, TableDescriptor};
use crate::record::Value;
use crate::storage::{Key, KeyCondition, KeyQuery};

/// Caller-supplied attribute values, keyed by attribute name.
pub type QueryValues = HashMap<String, String>;

/// The hash key of the chosen index had no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hash key {0} is required")]
pub struct MissingRequiredKey(pub String);

/// Store call that answers a query.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    /// Single-item fetch by exact primary key.
    PointRead { table: String, key: Key },
    /// Key-condition query; may return several items.
    Query(KeyQuery),
}

fn supplied<'a>(values: &'a QueryValues, attr: &str) -> Option<&'a str> {
    values
        .get(attr)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Build the store operation for `index` on `table`.
///
/// `index` must belong to `table`; its name doubles as the caller's index
/// selection (empty means the primary key was chosen).
pub fn translate(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    values: &QueryValues,
) -> Result<StoreOperation, MissingRequiredKey> {
    let hash_value = supplied(values, &index.hash_key)
        .ok_or_else(|| MissingRequiredKey(index.hash_key.clone()))?;

    if index.is_primary() && index.range_key.is_none() {
        let mut key = Key::new();
        key.insert(index.hash_key.clone(), Value::from(hash_value));
        return Ok(StoreOperation::PointRead {
            table: table.name.clone(),
            key,
        });
    }

    let range = index.range_key.as_ref().and_then(|attr| {
        supplied(values, attr).map(|value| KeyCondition::new(attr.clone(), value))
    });

    Ok(StoreOperation::Query(KeyQuery {
        table: table.name.clone(),
        index: (!index.is_primary()).then(|| index.name.clone()),
        hash: KeyCondition::new(index.hash_key.clone(), hash_value),
        range,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Environment};

    const CATALOG: &str = r#"
environments:
  staging:
    users:
      name: staging-users
      displayName: Users
      primaryKey: id
      indexes:
        - { name: "", displayName: ID, hashKey: id }
        - { name: email_index, displayName: Email, hashKey: email }
    orders:
      name: staging-orders
      displayName: Orders
      primaryKey: customer_id
      sortKey: order_id
"#;

    fn values(pairs: &[(&str, &str)]) -> QueryValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn translate_in(
        catalog: &Catalog,
        table: &str,
        index: &str,
        input: &[(&str, &str)],
    ) -> Result<StoreOperation, MissingRequiredKey> {
        let descriptor = catalog.lookup_table(Environment::Staging, table).unwrap();
        let index = catalog
            .lookup_index(Environment::Staging, table, index)
            .unwrap();
        translate(descriptor, index, &values(input))
    }

    #[test]
    fn test_primary_without_sort_key_is_point_read() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let op = translate_in(&catalog, "users", "", &[("id", "42")]).unwrap();

        let mut key = Key::new();
        key.insert("id", "42");
        assert_eq!(
            op,
            StoreOperation::PointRead {
                table: "staging-users".to_string(),
                key,
            }
        );
    }

    #[test]
    fn test_secondary_index_is_query() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let op = translate_in(&catalog, "users", "email_index", &[("email", "a@example.com")]).unwrap();

        let StoreOperation::Query(query) = op else {
            panic!("expected a key query, got {:?}", op);
        };
        assert_eq!(query.table, "staging-users");
        assert_eq!(query.index.as_deref(), Some("email_index"));
        assert_eq!(query.hash, KeyCondition::new("email", "a@example.com"));
        assert_eq!(query.range, None);
    }

    #[test]
    fn test_primary_with_sort_key_queries_table() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();

        let op = translate_in(&catalog, "orders", "", &[("customer_id", "c-1")]).unwrap();
        let StoreOperation::Query(query) = op else {
            panic!("expected a key query, got {:?}", op);
        };
        assert_eq!(query.index, None);
        assert_eq!(query.range, None);

        let op = translate_in(
            &catalog,
            "orders",
            "",
            &[("customer_id", "c-1"), ("order_id", "o-9")],
        )
        .unwrap();
        let StoreOperation::Query(query) = op else {
            panic!("expected a key query, got {:?}", op);
        };
        assert_eq!(query.range, Some(KeyCondition::new("order_id", "o-9")));
    }

    #[test]
    fn test_empty_range_value_leaves_range_unbound() {
        let catalog = Catalog::builtin().unwrap();
        let table = catalog.lookup_table(Environment::Staging, "progress").unwrap();
        let index = table.index("phone_number_device_id").unwrap();

        let op = translate(
            table,
            index,
            &values(&[("phone_number", "6591234567"), ("device_id", "")]),
        )
        .unwrap();
        let StoreOperation::Query(query) = op else {
            panic!("expected a key query, got {:?}", op);
        };
        assert_eq!(query.table, "non-prod-uat-onboarding-progress");
        assert_eq!(query.range, None);
        assert_eq!(query.key_condition_expression(), "#hk = :hashVal");
    }

    #[test]
    fn test_missing_hash_value_names_attribute() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();

        let err = translate_in(&catalog, "users", "email_index", &[("id", "42")]).unwrap_err();
        assert_eq!(err, MissingRequiredKey("email".to_string()));
        assert_eq!(err.to_string(), "hash key email is required");

        let err = translate_in(&catalog, "users", "", &[("id", "")]).unwrap_err();
        assert_eq!(err, MissingRequiredKey("id".to_string()));
    }

    #[test]
    fn test_extra_values_ignored() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let op = translate_in(&catalog, "users", "", &[("id", "42"), ("email", "x")]).unwrap();
        assert!(matches!(op, StoreOperation::PointRead { .. }));
    }
}
