//! Identity, import key and plan types shared across the provider.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Separator between segments of a composite identifier.
pub const ID_SEPARATOR: char = '/';

/// Join parent and child identifiers into a composite identifier.
///
/// ```
/// use confluent_provider::types::composite_id;
///
/// assert_eq!(composite_id(&["env-123", "cp-456"]), "env-123/cp-456");
/// ```
pub fn composite_id(segments: &[&str]) -> String {
    segments.join(&ID_SEPARATOR.to_string())
}

/// An import identifier split into its named segments.
///
/// Every kind documents its key format, e.g. `<environment_id>/<network_id>`.
/// Parsing fails with a [`ProviderError::Validation`] naming the expected format
/// when the segment count is wrong or a segment is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportKey {
    names: &'static [&'static str],
    segments: Vec<String>,
}

impl ImportKey {
    /// Split `raw` into exactly `names.len()` segments.
    pub fn parse(raw: &str, names: &'static [&'static str]) -> Result<Self, ProviderError> {
        let segments: Vec<String> = raw.split(ID_SEPARATOR).map(str::to_string).collect();

        if segments.len() != names.len() || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ProviderError::Validation(format!(
                "invalid import ID '{}': expected format {} ({} segment{} separated by '{}'), got {} segment{}",
                raw,
                Self::format(names),
                names.len(),
                if names.len() == 1 { "" } else { "s" },
                ID_SEPARATOR,
                segments.len(),
                if segments.len() == 1 { "" } else { "s" },
            )));
        }

        Ok(Self { names, segments })
    }

    /// The documented key format, e.g. `<environment_id>/<network_id>`.
    pub fn format(names: &[&str]) -> String {
        names
            .iter()
            .map(|n| format!("<{}>", n))
            .collect::<Vec<_>>()
            .join(&ID_SEPARATOR.to_string())
    }

    /// The segment called `name`, if the key format has one.
    pub fn segment(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| self.segments[i].as_str())
    }

    /// The last segment, which identifies the object itself.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// All segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The segments joined back into a composite identifier.
    pub fn to_id(&self) -> String {
        self.segments.join(&ID_SEPARATOR.to_string())
    }
}

/// A change to a single top-level attribute in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub path: String,
    /// Value before the change, `None` when creating.
    pub before: Option<serde_json::Value>,
    /// Value after the change, `None` when removing.
    pub after: Option<serde_json::Value>,
    /// Whether this change alone forces replacement.
    #[serde(default)]
    pub requires_replace: bool,
}

impl AttributeChange {
    /// Create a change.
    pub fn new(
        path: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            path: path.into(),
            before,
            after,
            requires_replace: false,
        }
    }

    /// A newly set attribute.
    pub fn added(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// A removed attribute.
    pub fn removed(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// A modified attribute.
    pub fn modified(
        path: impl Into<String>,
        before: serde_json::Value,
        after: serde_json::Value,
    ) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    /// Mark the change as forcing replacement.
    pub fn replacing(mut self) -> Self {
        self.requires_replace = true;
        self
    }
}

/// The outcome of planning a change to one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State expected after apply.
    pub planned_state: serde_json::Value,
    /// Attribute-level changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource must be destroyed and recreated.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A plan with no changes.
    pub fn no_change(state: serde_json::Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// A plan with the given changes; replacement is required if any change requires it.
    pub fn with_changes(planned_state: serde_json::Value, changes: Vec<AttributeChange>) -> Self {
        let requires_replace = changes.iter().any(|c| c.requires_replace);
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether anything changes.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// A resource brought under management by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The full observed state.
    pub state: serde_json::Value,
}

impl ImportedResource {
    /// Create an imported resource.
    pub fn new(resource_type: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Names of everything the provider manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    const POOL_KEY: &[&str] = &["environment_id", "compute_pool_id"];

    #[test]
    fn test_import_key_splits_segments() {
        let key = ImportKey::parse("env-123/cp-456", POOL_KEY).unwrap();
        assert_eq!(key.segment("environment_id"), Some("env-123"));
        assert_eq!(key.segment("compute_pool_id"), Some("cp-456"));
        assert_eq!(key.segment("missing"), None);
        assert_eq!(key.leaf(), "cp-456");
        assert_eq!(key.segments().len(), 2);
        assert_eq!(key.to_id(), "env-123/cp-456");
    }

    #[test]
    fn test_import_key_missing_segment() {
        let err = ImportKey::parse("env-123", POOL_KEY).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let message = err.to_string();
        assert!(message.contains("'env-123'"));
        assert!(message.contains("<environment_id>/<compute_pool_id>"));
        assert!(message.contains("got 1 segment"));
    }

    #[test]
    fn test_import_key_extra_or_empty_segments() {
        assert!(ImportKey::parse("env-123/cp-456/x", POOL_KEY).is_err());
        assert!(ImportKey::parse("env-123/", POOL_KEY).is_err());
        assert!(ImportKey::parse("/cp-456", POOL_KEY).is_err());
        assert!(ImportKey::parse("", &["environment_id"]).is_err());
    }

    #[test]
    fn test_single_segment_key() {
        let key = ImportKey::parse("env-abc", &["environment_id"]).unwrap();
        assert_eq!(key.leaf(), "env-abc");
    }

    #[test]
    fn test_composite_id() {
        assert_eq!(composite_id(&["lkc-1", "orders"]), "lkc-1/orders");
        assert_eq!(composite_id(&["env-1"]), "env-1");
    }

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("display_name", json!("a"));
        assert!(added.before.is_none());
        assert!(!added.requires_replace);

        let removed = AttributeChange::removed("description", json!("old"));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("cloud", json!("AWS"), json!("GCP")).replacing();
        assert!(modified.requires_replace);
    }

    #[test]
    fn test_plan_result_replacement() {
        let plan = PlanResult::no_change(json!({"id": "n-1"}));
        assert!(!plan.has_changes());
        assert!(!plan.requires_replace);

        let plan = PlanResult::with_changes(
            json!({"id": "n-1"}),
            vec![
                AttributeChange::modified("display_name", json!("a"), json!("b")),
                AttributeChange::modified("cloud", json!("AWS"), json!("GCP")).replacing(),
            ],
        );
        assert!(plan.has_changes());
        assert!(plan.requires_replace);
    }

    #[test]
    fn test_imported_resource() {
        let imported = ImportedResource::new("confluent_network", json!({"id": "n-1"}));
        assert_eq!(imported.resource_type, "confluent_network");
        assert_eq!(imported.state["id"], "n-1");
    }
}
