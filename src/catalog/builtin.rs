//! Built-in catalog: the onboarding tables, mirrored across environments.

use std::collections::BTreeMap;

use super::{CatalogDefinition, Environment, IndexDescriptor, TableDescriptor};

fn index(name: &str, display_name: &str, hash_key: &str, range_key: Option<&str>) -> IndexDescriptor {
    IndexDescriptor {
        name: name.to_string(),
        display_name: display_name.to_string(),
        hash_key: hash_key.to_string(),
        range_key: range_key.map(str::to_string),
    }
}

fn prospect(prefix: &str) -> TableDescriptor {
    TableDescriptor {
        name: format!("{}-onboarding-prospect", prefix),
        display_name: "Prospect".to_string(),
        primary_key: "phone_number".to_string(),
        sort_key: None,
        indexes: vec![
            index("", "Phone Number (Primary)", "phone_number", None),
            index("prospect_id_index", "Prospect ID", "prospect_id", None),
            index("id_card_no_index", "ID Card Number", "id_card_no", None),
            index("device_id_index", "Device ID", "device_id", None),
            index("cif_number_index", "CIF Number", "cif_number", None),
        ],
    }
}

fn progress(prefix: &str) -> TableDescriptor {
    TableDescriptor {
        name: format!("{}-onboarding-progress", prefix),
        display_name: "Onboard Progress".to_string(),
        primary_key: "onboard_id".to_string(),
        sort_key: None,
        indexes: vec![
            index("", "Onboard ID (Primary)", "onboard_id", None),
            index(
                "phone_number_device_id",
                "Phone + Device ID",
                "phone_number",
                Some("device_id"),
            ),
            index(
                "reserved_cif_number_index",
                "Reserved CIF Number",
                "reserved_cif_number",
                None,
            ),
        ],
    }
}

/// Physical table name prefix per environment.
fn table_prefix(env: Environment) -> &'static str {
    match env {
        Environment::Staging => "non-prod-uat",
        Environment::Production => "prod",
    }
}

pub(super) fn definition() -> CatalogDefinition {
    let environments = Environment::ALL
        .into_iter()
        .map(|env| {
            let prefix = table_prefix(env);
            let tables = BTreeMap::from([
                ("prospect".to_string(), prospect(prefix)),
                ("progress".to_string(), progress(prefix)),
            ]);
            (env, tables)
        })
        .collect();

    CatalogDefinition { environments }
}
