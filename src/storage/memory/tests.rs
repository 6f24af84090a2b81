use super::*;
use crate::storage::KeyCondition;

fn user(id: &str, email: &str, name: &str) -> Record {
    let mut record = Record::new();
    record.insert("id", id);
    record.insert("email", email);
    record.insert("name", name);
    record
}

fn key(attr: &str, value: &str) -> Key {
    let mut key = Key::new();
    key.insert(attr, value);
    key
}

fn users_store() -> MemoryStore {
    MemoryStore::new().with_table("staging-users", &["id"])
}

#[tokio::test]
async fn test_put_then_get() {
    let store = users_store();
    store
        .put_item("staging-users", user("42", "a@example.com", "Ada"))
        .await
        .unwrap();

    let found = store.get_item("staging-users", &key("id", "42")).await.unwrap();
    assert_eq!(found, Some(user("42", "a@example.com", "Ada")));

    let missing = store.get_item("staging-users", &key("id", "7")).await.unwrap();
    assert_eq!(missing, None);

    let stats = store.stats();
    assert_eq!(stats.puts, 1);
    assert_eq!(stats.point_reads, 2);
    assert_eq!(stats.queries, 0);
}

#[tokio::test]
async fn test_put_replaces_whole_item() {
    let store = users_store();
    store
        .put_item("staging-users", user("42", "a@example.com", "Ada"))
        .await
        .unwrap();

    let mut replacement = Record::new();
    replacement.insert("id", "42");
    replacement.insert("name", "Ada L.");
    store
        .put_item("staging-users", replacement.clone())
        .await
        .unwrap();

    let items = store.items("staging-users").await;
    assert_eq!(items, vec![replacement]);
    assert!(items[0].get("email").is_none());
}

#[tokio::test]
async fn test_put_requires_key_attributes() {
    let store = users_store();
    let mut record = Record::new();
    record.insert("email", "a@example.com");

    let err = store.put_item("staging-users", record).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Serialization("item is missing key attribute id".to_string())
    );
}

#[tokio::test]
async fn test_unknown_table_is_unavailable() {
    let store = users_store();
    let err = store.get_item("nope", &key("id", "1")).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_query_hash_only_returns_all_sharing_hash() {
    let store = MemoryStore::new().with_table("progress", &["onboard_id"]);
    for (id, phone, device) in [
        ("o-1", "659", "dev-1"),
        ("o-2", "659", "dev-2"),
        ("o-3", "650", "dev-1"),
    ] {
        let mut record = Record::new();
        record.insert("onboard_id", id);
        record.insert("phone_number", phone);
        record.insert("device_id", device);
        store.seed("progress", record).await.unwrap();
    }

    let query = KeyQuery {
        table: "progress".to_string(),
        index: Some("phone_number_device_id".to_string()),
        hash: KeyCondition::new("phone_number", "659"),
        range: None,
    };
    let page = store.query(&query).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(!page.truncated);

    let narrowed = KeyQuery {
        range: Some(KeyCondition::new("device_id", "dev-2")),
        ..query
    };
    let page = store.query(&narrowed).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].get("onboard_id"), Some(&Value::from("o-2")));

    assert_eq!(store.stats().queries, 2);
    assert_eq!(store.stats().puts, 0);
}

#[tokio::test]
async fn test_page_limit_truncates() {
    let store = users_store().with_page_limit(1);
    store.seed("staging-users", user("1", "same@example.com", "A")).await.unwrap();
    store.seed("staging-users", user("2", "same@example.com", "B")).await.unwrap();

    let query = KeyQuery {
        table: "staging-users".to_string(),
        index: Some("email_index".to_string()),
        hash: KeyCondition::new("email", "same@example.com"),
        range: None,
    };
    let page = store.query(&query).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.truncated);
}

#[tokio::test]
async fn test_delete_removes_and_tolerates_absent() {
    let store = users_store();
    store.seed("staging-users", user("42", "a@example.com", "Ada")).await.unwrap();

    store.delete_item("staging-users", &key("id", "42")).await.unwrap();
    store.delete_item("staging-users", &key("id", "42")).await.unwrap();

    assert!(store.items("staging-users").await.is_empty());
    assert_eq!(store.stats().deletes, 2);
}

#[tokio::test]
async fn test_point_operations_require_full_key() {
    let store = MemoryStore::new().with_table("sessions", &["user_id", "session_id"]);
    for session in ["s-1", "s-2", "s-3"] {
        let mut record = Record::new();
        record.insert("user_id", "u-1");
        record.insert("session_id", session);
        store.seed("sessions", record).await.unwrap();
    }

    let partial = key("user_id", "u-1");
    let err = store.delete_item("sessions", &partial).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Serialization(
            "key does not match the table key schema: expected user_id, session_id, got user_id"
                .to_string()
        )
    );
    assert!(store.get_item("sessions", &partial).await.is_err());
    assert_eq!(store.items("sessions").await.len(), 3);

    let mut full = key("user_id", "u-1");
    full.insert("session_id", "s-2");
    assert!(store.get_item("sessions", &full).await.unwrap().is_some());
    store.delete_item("sessions", &full).await.unwrap();
    assert_eq!(store.items("sessions").await.len(), 2);
}

#[tokio::test]
async fn test_from_catalog_registers_physical_tables() {
    let catalog = Catalog::builtin().unwrap();
    let store = MemoryStore::from_catalog(&catalog);

    let mut record = Record::new();
    record.insert("phone_number", "6591234567");
    store
        .put_item("prod-onboarding-prospect", record)
        .await
        .unwrap();

    assert_eq!(store.items("prod-onboarding-prospect").await.len(), 1);
    assert!(store.items("non-prod-uat-onboarding-prospect").await.is_empty());
}
