//! Forgiving `deserialize_with` helpers for model-written values.
//!
//! Structure is already checked by the validator; these only smooth over
//! the value-level sloppiness models are known for: `"JDMatch": 82` instead
//! of `"82%"`, `null` where a string was asked for, a string where an
//! optional list should be.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// String, number or bool as text; `null` as an empty string.
pub fn text<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    scalar_text(&value).ok_or_else(|| {
        D::Error::custom(format!("expected text, found {}", crate::pipeline::validate::describe(&value)))
    })
}

/// Array of scalars as strings. `null` entries are dropped; a non-array
/// becomes an empty list.
pub fn text_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(d)?;
    Ok(to_text_list(value))
}

/// Array of objects. Non-object entries are skipped; a non-array becomes an
/// empty list.
pub fn object_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Object of `name -> [text]`. Scalar values become one-element lists.
pub fn text_list_map<'de, D>(d: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| {
                let list = match v {
                    Value::Array(_) => to_text_list(v),
                    other => scalar_text(&other).into_iter().filter(|s| !s.is_empty()).collect(),
                };
                (k, list)
            })
            .collect()),
        other => Err(D::Error::custom(format!(
            "expected object, found {}",
            crate::pipeline::validate::describe(&other)
        ))),
    }
}

/// Object of `name -> text`. Entries holding arrays or objects are dropped.
pub fn text_map<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| scalar_text(&v).map(|text| (k, text)))
            .collect()),
        other => Err(D::Error::custom(format!(
            "expected object, found {}",
            crate::pipeline::validate::describe(&other)
        ))),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn to_text_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .filter_map(scalar_text)
            .collect(),
        _ => Vec::new(),
    }
}
