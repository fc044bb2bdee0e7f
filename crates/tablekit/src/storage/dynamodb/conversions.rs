//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB `AttributeValue` maps and
//! JSON attribute mappings. Testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use tablekit_core::{AttributeMapping, GeneratedKey, StoreError};

/// Convert a JSON value to a DynamoDB attribute value.
pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ),
    }
}

/// Convert a DynamoDB attribute value to a JSON value.
///
/// String and number sets become arrays. Binary values have no JSON form and
/// are rejected.
pub fn from_attribute_value(value: &AttributeValue) -> Result<Value, StoreError> {
    match value {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::Ss(values) => Ok(Value::Array(
            values.iter().cloned().map(Value::String).collect(),
        )),
        AttributeValue::Ns(values) => values
            .iter()
            .map(|n| parse_number(n))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::L(values) => values
            .iter()
            .map(from_attribute_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => map
            .iter()
            .map(|(k, v)| Ok::<_, StoreError>((k.clone(), from_attribute_value(v)?)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        AttributeValue::B(_) | AttributeValue::Bs(_) => Err(StoreError::Serialization(
            "binary attributes are not supported".to_string(),
        )),
        other => Err(StoreError::Serialization(format!(
            "unknown attribute value: {other:?}"
        ))),
    }
}

fn parse_number(n: &str) -> Result<Value, StoreError> {
    n.parse::<Number>()
        .map(Value::Number)
        .map_err(|e| StoreError::Serialization(format!("invalid number {n}: {e}")))
}

/// Convert an attribute mapping to a DynamoDB item.
pub fn to_item(mapping: &AttributeMapping) -> HashMap<String, AttributeValue> {
    mapping
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

/// Convert a DynamoDB item to an attribute mapping.
pub fn from_item(item: &HashMap<String, AttributeValue>) -> Result<AttributeMapping, StoreError> {
    item.iter()
        .map(|(k, v)| Ok::<_, StoreError>((k.clone(), from_attribute_value(v)?)))
        .collect()
}

/// Convert a generated key to a DynamoDB key map of string attributes.
pub fn key_to_item(key: &GeneratedKey) -> HashMap<String, AttributeValue> {
    key.iter()
        .map(|(attribute, value)| (attribute.to_string(), AttributeValue::S(value.to_string())))
        .collect()
}
