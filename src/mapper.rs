//! Helpers shared by the per-kind attribute mappers.
//!
//! Each resource kind converts between its typed remote representation and
//! its typed local state with a pair of pure functions. The helpers here cover
//! the conventions those functions have in common:
//!
//! - An optional nested object is stored as a list block of at most one item.
//!   [`wrap`] builds such a list and [`single`] reads it back.
//! - An absent collection is an empty list or map, never null.
//!   [`null_as_empty`] enforces this when deserializing.
//! - Sensitive values are stored as-is but masked by [`redacted`] before a
//!   snapshot is logged or reported.

use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Block, Schema};

/// Replacement text for sensitive values in snapshots.
pub const REDACTED: &str = "(sensitive value)";

/// A reference to a parent object by ID, e.g. `environment { id = ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
pub struct IdRef {
    /// The referenced ID.
    pub id: String,
}

impl IdRef {
    /// Create a reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Encode an optional nested object as a list block: `None` is an empty list.
pub fn wrap<T>(value: Option<T>) -> Vec<T> {
    value.into_iter().collect()
}

/// Decode a list block holding an optional nested object.
pub fn single<T>(block: &[T]) -> Option<&T> {
    block.first()
}

/// The ID held by a one-element reference block, or an empty string.
pub fn ref_id(block: &[IdRef]) -> &str {
    single(block).map(|r| r.id.as_str()).unwrap_or_default()
}

/// Deserialize a collection, treating `null` the same as absent.
///
/// Use with `#[serde(default, deserialize_with = "null_as_empty")]`.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode typed local state from a configuration or state value.
///
/// Null attributes are dropped first, so unset scalars take their
/// `#[serde(default)]` value.
pub fn from_state<T: DeserializeOwned>(value: &Value) -> Result<T, ProviderError> {
    let mut value = value.clone();
    drop_nulls(&mut value);
    serde_json::from_value(value).map_err(|e| {
        ProviderError::Validation(format!("configuration does not match the schema: {}", e))
    })
}

fn drop_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(drop_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(drop_nulls),
        _ => {}
    }
}

/// Encode typed local state.
pub fn to_state<T: Serialize>(local: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(local)?)
}

/// A copy of `value` with every sensitive attribute in `schema` masked.
///
/// Null and empty values are kept as they are so that a snapshot still shows
/// whether a secret was set.
pub fn redacted(schema: &Schema, value: &Value) -> Value {
    let mut copy = value.clone();
    redact_block(&schema.block, &mut copy);
    copy
}

fn redact_block(block: &Block, value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    for (name, attr) in &block.attributes {
        if !attr.flags.sensitive {
            continue;
        }
        if let Some(v) = obj.get_mut(name) {
            mask(v);
        }
    }

    for (name, nested) in &block.blocks {
        if let Some(Value::Array(items)) = obj.get_mut(name) {
            for item in items {
                redact_block(&nested.block, item);
            }
        }
    }
}

fn mask(value: &mut Value) {
    match value {
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        Value::Object(map) => {
            for v in map.values_mut() {
                *v = Value::String(REDACTED.to_string());
            }
        }
        other => *other = Value::String(REDACTED.to_string()),
    }
}
