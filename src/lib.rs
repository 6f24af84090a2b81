//! ddbgate - catalog-driven DynamoDB gateway
//!
//! Resolves an (environment, table, index) triple against a static catalog,
//! translates caller-supplied key values into a point read or a key-condition
//! query, and exposes query/update/guarded-delete over a small JSON API with
//! a bundled browser UI.

pub mod api;
pub mod catalog;
pub mod config;
pub mod gateway;
pub mod guard;
pub mod query;
pub mod record;
pub mod storage;
pub mod utils;
