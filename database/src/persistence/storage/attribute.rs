use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Number, Value};

use super::{Document, StorageError, StorageResult};

pub type Item = HashMap<String, AttributeValue>;

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

pub fn from_attribute_value(value: &AttributeValue) -> StorageResult<Value> {
    let converted = match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::Ss(strings) => {
            Value::Array(strings.iter().map(|s| Value::String(s.clone())).collect())
        }
        AttributeValue::Ns(numbers) => Value::Array(
            numbers
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<StorageResult<Vec<Value>>>()?,
        ),
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(from_attribute_value)
                .collect::<StorageResult<Vec<Value>>>()?,
        ),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| from_attribute_value(v).map(|v| (k.clone(), v)))
                .collect::<StorageResult<Document>>()?,
        ),
        // Binary attributes are never written by this service
        other => {
            return Err(StorageError::MalformedItem(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    };

    Ok(converted)
}

fn parse_number(n: &str) -> StorageResult<Number> {
    n.parse::<Number>()
        .map_err(|e| StorageError::MalformedItem(format!("invalid number {n}: {e}")))
}

pub fn to_item(document: &Document) -> Item {
    document
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

pub fn from_item(item: &Item) -> StorageResult<Document> {
    item.iter()
        .map(|(k, v)| from_attribute_value(v).map(|v| (k.clone(), v)))
        .collect()
}
