//! Managed resource kinds.
//!
//! Each module defines one [`ResourceKind`](crate::lifecycle::ResourceKind):
//! its schema, typed state, remote model and API calls. [`registry`] wraps
//! them in [`Lifecycle`] orchestrators for the provider.

pub mod connector;
pub mod environment;
pub mod flink_compute_pool;
pub mod kafka_cluster;
pub mod kafka_topic;
pub mod network;
pub mod service_account;

use serde::{Deserialize, Serialize};

use crate::lifecycle::{DynResource, Lifecycle, ResourceKind};
use crate::mapper::IdRef;
use crate::wait::WaitOptions;

/// Every resource kind, optionally with all waits overridden.
pub fn registry(waits: Option<WaitOptions>) -> Vec<Box<dyn DynResource>> {
    fn boxed<K: ResourceKind>(kind: K, waits: Option<WaitOptions>) -> Box<dyn DynResource> {
        let lifecycle = Lifecycle::new(kind);
        match waits {
            Some(options) => Box::new(lifecycle.with_waits(options)),
            None => Box::new(lifecycle),
        }
    }

    vec![
        boxed(environment::Environment, waits),
        boxed(service_account::ServiceAccount, waits),
        boxed(network::Network, waits),
        boxed(kafka_cluster::KafkaCluster, waits),
        boxed(kafka_topic::KafkaTopic, waits),
        boxed(flink_compute_pool::FlinkComputePool, waits),
        boxed(connector::Connector, waits),
    ]
}

/// The `{"id": ...}` reference used in request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) struct ObjectRef {
    pub id: String,
}

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn to_block(&self) -> Vec<IdRef> {
        vec![IdRef::new(self.id.clone())]
    }
}

/// `metadata` returned by the Cloud APIs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub(crate) struct Metadata {
    #[serde(default)]
    pub resource_name: String,
}

/// `status` of objects provisioned asynchronously.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub(crate) struct PhaseStatus {
    pub phase: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl PhaseStatus {
    /// The server's failure message, or a generic one naming the phase.
    pub fn failure_reason(&self) -> String {
        match (&self.error_code, &self.error_message) {
            (Some(code), Some(message)) => format!("{} ({})", message, code),
            (None, Some(message)) => message.clone(),
            _ => format!("remote object entered phase {}", self.phase),
        }
    }
}

/// `base/{id}`, with `id` percent-encoded as one path segment.
pub(crate) fn child_path(base: &str, id: &str) -> String {
    format!("{}/{}", base, urlencoding::encode(id))
}

/// Append the percent-encoded `environment` query parameter.
pub(crate) fn in_environment(path: &str, environment_id: &str) -> String {
    format!("{}?environment={}", path, urlencoding::encode(environment_id))
}

/// Check `value` is one of `allowed`.
pub(crate) fn one_of(
    attribute: &str,
    value: &str,
    allowed: &[&str],
) -> Result<(), crate::error::ProviderError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(crate::error::ProviderError::Validation(format!(
            "'{}' must be one of {}, got '{}'",
            attribute,
            allowed.join(", "),
            value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let registry = registry(None);
        let mut names: Vec<_> = registry.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"confluent_network"));
    }

    #[test]
    fn test_phase_status_failure_reason() {
        let status = PhaseStatus {
            phase: "FAILED".to_string(),
            error_code: Some("quota_exceeded".to_string()),
            error_message: Some("Network quota reached".to_string()),
        };
        assert_eq!(status.failure_reason(), "Network quota reached (quota_exceeded)");

        let status = PhaseStatus {
            phase: "FAILED".to_string(),
            ..Default::default()
        };
        assert_eq!(status.failure_reason(), "remote object entered phase FAILED");
    }

    #[test]
    fn test_one_of() {
        assert!(one_of("cloud", "AWS", &["AWS", "GCP"]).is_ok());
        let err = one_of("cloud", "aws", &["AWS", "GCP"]).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: 'cloud' must be one of AWS, GCP, got 'aws'");
    }

    #[test]
    fn test_in_environment() {
        assert_eq!(
            in_environment("/networking/v1/networks/n-1", "env-1"),
            "/networking/v1/networks/n-1?environment=env-1"
        );
    }

    #[test]
    fn test_identifiers_cannot_escape_their_segment() {
        assert_eq!(child_path("/org/v2/environments", "env-1"), "/org/v2/environments/env-1");
        assert_eq!(
            child_path("/org/v2/environments", "env-1?x=1#frag"),
            "/org/v2/environments/env-1%3Fx%3D1%23frag"
        );
        assert_eq!(
            in_environment(&child_path("/networking/v1/networks", "n-1"), "env-1&environment=env-2"),
            "/networking/v1/networks/n-1?environment=env-1%26environment%3Denv-2"
        );
    }
}
