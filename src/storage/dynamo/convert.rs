//! `Value` <-> `AttributeValue` conversion.
//!
//! Encoding is total. Decoding maps sets to lists and binary to base64
//! text; numbers that do not parse as JSON numbers are rejected.

use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use base64::Engine;

use crate::record::{Record, Value};
use crate::storage::{Result, StoreError};

pub fn to_attribute_value(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::List(items) => AttributeValue::L(items.into_iter().map(to_attribute_value).collect()),
        Value::Map(map) => AttributeValue::M(
            map.into_iter()
                .map(|(k, v)| (k, to_attribute_value(v)))
                .collect(),
        ),
    }
}

pub fn to_item(record: Record) -> HashMap<String, AttributeValue> {
    record
        .into_iter()
        .map(|(k, v)| (k, to_attribute_value(v)))
        .collect()
}

fn number(text: &str) -> Result<Value> {
    serde_json::Number::from_str(text)
        .map(Value::Number)
        .map_err(|e| StoreError::Serialization(format!("invalid number {}: {}", text, e)))
}

fn binary(bytes: &[u8]) -> Value {
    Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
}

pub fn from_attribute_value(value: AttributeValue) -> Result<Value> {
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => number(&n)?,
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::L(items) => Value::List(
            items
                .into_iter()
                .map(from_attribute_value)
                .collect::<Result<_>>()?,
        ),
        AttributeValue::M(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| from_attribute_value(v).map(|v| (k, v)))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::Ss(items) => Value::List(items.into_iter().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::List(
            items
                .iter()
                .map(|n| number(n))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::B(blob) => binary(blob.as_ref()),
        AttributeValue::Bs(blobs) => Value::List(blobs.iter().map(|b| binary(b.as_ref())).collect()),
        other => {
            return Err(StoreError::Serialization(format!(
                "unsupported attribute value: {:?}",
                other
            )))
        }
    })
}

pub fn from_item(item: HashMap<String, AttributeValue>) -> Result<Record> {
    item.into_iter()
        .map(|(k, v)| from_attribute_value(v).map(|v| (k, v)))
        .collect()
}
