//! Configuration validation against a [`Schema`].
//!
//! Validation runs before any network call: a resource whose desired
//! configuration fails here never reaches the API.
//!
//! # Example
//!
//! ```
//! use confluent_provider::schema::{Attribute, ExactlyOneOf, Block, NestedBlock, Schema};
//! use confluent_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("display_name", Attribute::required_string())
//!     .with_block("basic", NestedBlock::single(Block::new()))
//!     .with_block("standard", NestedBlock::single(Block::new()))
//!     .with_exactly_one_of(ExactlyOneOf::new(["basic", "standard"]));
//!
//! assert!(validate(&schema, &json!({"display_name": "c", "basic": [{}]})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"display_name": "c", "basic": [{}], "standard": [{}]}));
//! assert_eq!(diagnostics.len(), 1);
//! ```

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};

/// Validate `value` against `schema`.
///
/// Checks required attributes, attribute types, nested block item counts and
/// exactly-one-of groups. Computed-only attributes are ignored. An empty
/// result means the value is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`], but returns the diagnostics as an error.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.iter().any(Diagnostic::is_error) {
        Err(diagnostics)
    } else {
        Ok(())
    }
}

/// Whether `value` is valid against `schema`.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate_result(schema, value).is_ok()
}

/// Validate and fold every error diagnostic into one [`ProviderError::Validation`].
pub fn ensure_valid(schema: &Schema, value: &Value) -> Result<(), ProviderError> {
    validate_result(schema, value).map_err(|diagnostics| {
        ProviderError::Validation(
            diagnostics
                .iter()
                .filter(|d| d.is_error())
                .map(describe)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}

fn describe(diagnostic: &Diagnostic) -> String {
    match &diagnostic.detail {
        Some(detail) => format!("{} ({})", diagnostic.summary, detail),
        None => diagnostic.summary.clone(),
    }
}

/// Whether an attribute or block value counts as set.
///
/// Null, and an empty list for a block, count as unset.
pub fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        other => {
            let diagnostic = Diagnostic::error("Expected object")
                .with_detail(format!("got {}", value_type_name(other)));
            diagnostics.push(if path.is_empty() {
                diagnostic
            } else {
                diagnostic.with_attribute(path)
            });
            return;
        }
    };

    for (name, attr) in &block.attributes {
        validate_attribute(attr, obj.get(name), &join_path(path, name), diagnostics);
    }

    for (name, nested) in &block.blocks {
        validate_nested_block(nested, obj.get(name), &join_path(path, name), diagnostics);
    }

    for group in &block.exactly_one_of {
        let set: Vec<&str> = group
            .0
            .iter()
            .filter(|name| is_set(obj.get(name.as_str())))
            .map(String::as_str)
            .collect();
        if set.len() != 1 {
            let names = group
                .0
                .iter()
                .map(|n| format!("'{}'", join_path(path, n)))
                .collect::<Vec<_>>()
                .join(", ");
            let detail = if set.is_empty() {
                "none is set".to_string()
            } else {
                format!("{} are set", set.join(" and "))
            };
            diagnostics.push(
                Diagnostic::error(format!("Exactly one of {} must be set", names))
                    .with_detail(detail),
            );
        }
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_attribute(path),
                );
            }
        }
        Some(v) => validate_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String if !value.is_string() => {
            diagnostics.push(type_error(path, "string", value))
        }
        AttributeType::Int64 if !is_int64(value) => {
            diagnostics.push(type_error(path, "int64", value))
        }
        AttributeType::Bool if !value.is_boolean() => {
            diagnostics.push(type_error(path, "bool", value))
        }
        AttributeType::List(element) | AttributeType::Set(element) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_type(element, item, &format!("{}.{}", path, i), diagnostics);
                }
            }
            None => diagnostics.push(type_error(path, "list", value)),
        },
        AttributeType::Map(element) => match value.as_object() {
            Some(entries) => {
                for (key, item) in entries {
                    validate_type(element, item, &format!("{}.{}", path, key), diagnostics);
                }
            }
            None => diagnostics.push(type_error(path, "map", value)),
        },
        _ => {}
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let items = match value {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("got {}", value_type_name(other)))
                    .with_attribute(path),
            );
            return;
        }
    };

    let len = items.len() as u32;
    if len < nested.min_items && !(len == 0 && nested.computed) {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (i, item) in items.iter().enumerate() {
        validate_block(&nested.block, item, &format!("{}.{}", path, i), diagnostics);
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::ExactlyOneOf;
    use serde_json::json;

    fn topic_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("topic_name", Attribute::required_string())
            .with_attribute("partitions_count", Attribute::optional_computed_int64())
            .with_attribute("config", Attribute::new(
                AttributeType::string_map(),
                crate::schema::AttributeFlags::optional_computed(),
            ))
            .with_block(
                "kafka_cluster",
                NestedBlock::required_single(
                    Block::new().with_attribute("id", Attribute::required_string()),
                ),
            )
            .with_block(
                "credentials",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("key", Attribute::required_string())
                        .with_attribute("secret", Attribute::required_string().sensitive()),
                ),
            )
    }

    fn cluster_schema() -> Schema {
        Schema::v0()
            .with_attribute("display_name", Attribute::required_string())
            .with_block("basic", NestedBlock::single(Block::new()))
            .with_block("standard", NestedBlock::single(Block::new()))
            .with_block(
                "dedicated",
                NestedBlock::single(Block::new().with_attribute("cku", Attribute::required_int64())),
            )
            .with_exactly_one_of(ExactlyOneOf::new(["basic", "standard", "dedicated"]))
    }

    #[test]
    fn test_valid_topic() {
        let value = json!({
            "topic_name": "orders",
            "partitions_count": 6,
            "config": {"cleanup.policy": "compact"},
            "kafka_cluster": [{"id": "lkc-1"}]
        });
        assert!(validate(&topic_schema(), &value).is_empty());
    }

    #[test]
    fn test_missing_required_attribute() {
        let value = json!({"kafka_cluster": [{"id": "lkc-1"}]});
        let diagnostics = validate(&topic_schema(), &value);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("topic_name"));
    }

    #[test]
    fn test_computed_attribute_ignored() {
        let value = json!({
            "id": 42,
            "topic_name": "orders",
            "kafka_cluster": [{"id": "lkc-1"}]
        });
        assert!(validate(&topic_schema(), &value).is_empty());
    }

    #[test]
    fn test_type_errors() {
        let value = json!({
            "topic_name": "orders",
            "partitions_count": "six",
            "config": {"retention.ms": 100},
            "kafka_cluster": [{"id": "lkc-1"}]
        });
        let diagnostics = validate(&topic_schema(), &value);
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert!(paths.contains(&"partitions_count"));
        assert!(paths.contains(&"config.retention.ms"));
    }

    #[test]
    fn test_whole_float_accepted_as_int() {
        let value = json!({
            "topic_name": "orders",
            "partitions_count": 6.0,
            "kafka_cluster": [{"id": "lkc-1"}]
        });
        assert!(is_valid(&topic_schema(), &value));
    }

    #[test]
    fn test_nested_block_item_counts() {
        let missing = json!({"topic_name": "orders"});
        let diagnostics = validate(&topic_schema(), &missing);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let too_many = json!({
            "topic_name": "orders",
            "kafka_cluster": [{"id": "lkc-1"}, {"id": "lkc-2"}]
        });
        let diagnostics = validate(&topic_schema(), &too_many);
        assert!(diagnostics[0].summary.contains("at most 1"));
    }

    #[test]
    fn test_nested_block_attributes() {
        let value = json!({
            "topic_name": "orders",
            "kafka_cluster": [{"id": "lkc-1"}],
            "credentials": [{"key": "K"}]
        });
        let diagnostics = validate(&topic_schema(), &value);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("credentials.0.secret"));
    }

    #[test]
    fn test_block_must_be_list() {
        let value = json!({"topic_name": "orders", "kafka_cluster": {"id": "lkc-1"}});
        let diagnostics = validate(&topic_schema(), &value);
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_exactly_one_of() {
        let schema = cluster_schema();
        assert!(is_valid(&schema, &json!({"display_name": "c", "basic": [{}]})));
        assert!(is_valid(&schema, &json!({"display_name": "c", "dedicated": [{"cku": 2}]})));

        let none = validate(&schema, &json!({"display_name": "c"}));
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].detail.as_deref(), Some("none is set"));

        let both = validate(&schema, &json!({"display_name": "c", "basic": [{}], "standard": [{}]}));
        assert_eq!(both.len(), 1);
        assert!(both[0].summary.contains("'basic'"));
        assert_eq!(both[0].detail.as_deref(), Some("basic and standard are set"));

        // An empty list does not count as set
        assert!(is_valid(&schema, &json!({"display_name": "c", "basic": [], "standard": [{}]})));
    }

    #[test]
    fn test_root_not_object() {
        let diagnostics = validate(&topic_schema(), &json!("nope"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].attribute.is_none());
    }

    #[test]
    fn test_ensure_valid_folds_messages() {
        let err = ensure_valid(&cluster_schema(), &json!({"basic": [{}], "standard": [{}]}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let message = err.to_string();
        assert!(message.contains("display_name"));
        assert!(message.contains("Exactly one of"));
    }

    #[test]
    fn test_is_set() {
        assert!(!is_set(None));
        assert!(!is_set(Some(&Value::Null)));
        assert!(!is_set(Some(&json!([]))));
        assert!(is_set(Some(&json!([{}]))));
        assert!(is_set(Some(&json!(""))));
    }
}
