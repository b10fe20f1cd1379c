//! Error types for the provider.
//!
//! Every failure surfaced to the caller is a [`ProviderError`]. Errors raised
//! inside a resource transition are wrapped in [`ProviderError::Resource`] so the
//! message always names the resource type and its identifier.

use std::time::Duration;

use thiserror::Error;

use crate::schema::Diagnostic;
use crate::status::LifecycleState;

/// Placeholder used in error messages before the server has assigned an ID.
pub const UNASSIGNED_ID: &str = "not yet assigned";

/// Errors that can occur while managing resources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The desired configuration is malformed or contradictory. No remote call was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote object does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The API rejected the request, or transient failures exhausted the retry budget.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code of the last response.
        status: u16,
        /// Server-provided error message, verbatim.
        message: String,
    },

    /// The request could not be delivered after all transport retries.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote object reached a failed state.
    #[error("Remote operation failed: {0}")]
    RemoteFailed(String),

    /// The remote object did not reach a target state in time.
    #[error("Timed out after {elapsed:?} waiting for a stable state (last observed: {})", describe_state(.last_state))]
    Timeout {
        /// Last state observed before giving up.
        last_state: Option<LifecycleState>,
        /// Time spent polling.
        elapsed: Duration,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// The server reported a status this provider does not know how to classify.
    #[error("Unrecognized remote status: {0}")]
    UnrecognizedStatus(String),

    /// The provider configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error raised while operating on a specific resource.
    #[error("{resource_type} \"{id}\": {source}")]
    Resource {
        /// The resource type, e.g. `confluent_network`.
        resource_type: String,
        /// The resource identifier, or [`UNASSIGNED_ID`].
        id: String,
        /// The underlying error.
        #[source]
        source: Box<ProviderError>,
    },
}

fn describe_state(state: &Option<LifecycleState>) -> String {
    state.map_or_else(|| "none".to_string(), |s| s.to_string())
}

/// Coarse classification of a [`ProviderError`], ignoring resource context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`ProviderError::Validation`].
    Validation,
    /// See [`ProviderError::NotFound`].
    NotFound,
    /// See [`ProviderError::Api`].
    Api,
    /// See [`ProviderError::Transport`].
    Transport,
    /// See [`ProviderError::RemoteFailed`].
    RemoteFailed,
    /// See [`ProviderError::Timeout`].
    Timeout,
    /// See [`ProviderError::Cancelled`].
    Cancelled,
    /// See [`ProviderError::UnrecognizedStatus`].
    UnrecognizedStatus,
    /// See [`ProviderError::Configuration`].
    Configuration,
    /// See [`ProviderError::UnknownResource`].
    UnknownResource,
    /// See [`ProviderError::Serialization`].
    Serialization,
}

impl ProviderError {
    /// Wrap this error with the resource type and identifier it occurred on.
    ///
    /// An error that already carries resource context is returned unchanged.
    pub fn in_resource(self, resource_type: &str, id: Option<&str>) -> Self {
        match self {
            err @ ProviderError::Resource { .. } => err,
            err => ProviderError::Resource {
                resource_type: resource_type.to_string(),
                id: id.unwrap_or(UNASSIGNED_ID).to_string(),
                source: Box::new(err),
            },
        }
    }

    /// The classification of this error, looking through resource context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport(_) => ErrorKind::Transport,
            Self::RemoteFailed(_) => ErrorKind::RemoteFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::UnrecognizedStatus(_) => ErrorKind::UnrecognizedStatus,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::UnknownResource(_) => ErrorKind::UnknownResource,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Resource { source, .. } => source.kind(),
        }
    }

    /// Whether the remote object was reported as not existing.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The innermost error, without resource context.
    pub fn root(&self) -> &ProviderError {
        match self {
            Self::Resource { source, .. } => source.root(),
            err => err,
        }
    }

    /// Convert this error into an error diagnostic for the caller.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.to_string());
        match self.root() {
            ProviderError::Timeout { .. } => diagnostic.with_detail(
                "The remote object may still reach a stable state; re-running the operation is safe",
            ),
            ProviderError::Validation(_) => {
                diagnostic.with_detail("No request was sent to the API")
            }
            _ => diagnostic,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("env-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: env-123");

        let err = ProviderError::Api {
            status: 403,
            message: "Forbidden Access".to_string(),
        };
        assert_eq!(format!("{}", err), "API error (HTTP 403): Forbidden Access");

        let err = ProviderError::UnrecognizedStatus("MIGRATING".to_string());
        assert_eq!(format!("{}", err), "Unrecognized remote status: MIGRATING");
    }

    #[test]
    fn test_timeout_display_includes_last_state() {
        let err = ProviderError::Timeout {
            last_state: Some(LifecycleState::Provisioning),
            elapsed: Duration::from_secs(60),
        };
        let display = err.to_string();
        assert!(display.contains("60s"));
        assert!(display.contains("provisioning"));

        let err = ProviderError::Timeout {
            last_state: None,
            elapsed: Duration::from_secs(1),
        };
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_in_resource_names_kind_and_id() {
        let err = ProviderError::RemoteFailed("quota exceeded".to_string())
            .in_resource("confluent_network", Some("n-abc123"));
        assert_eq!(
            err.to_string(),
            "confluent_network \"n-abc123\": Remote operation failed: quota exceeded"
        );
        assert_eq!(err.kind(), ErrorKind::RemoteFailed);
    }

    #[test]
    fn test_in_resource_before_create() {
        let err = ProviderError::Validation("bad".to_string())
            .in_resource("confluent_kafka_cluster", None);
        assert!(err.to_string().contains(UNASSIGNED_ID));
    }

    #[test]
    fn test_in_resource_does_not_double_wrap() {
        let err = ProviderError::NotFound("x".to_string())
            .in_resource("confluent_environment", Some("env-1"))
            .in_resource("confluent_environment", Some("env-2"));
        assert!(err.to_string().contains("env-1"));
        assert!(!err.to_string().contains("env-2"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_to_diagnostic() {
        let diag = ProviderError::Timeout {
            last_state: None,
            elapsed: Duration::from_secs(5),
        }
        .in_resource("confluent_network", Some("n-1"))
        .to_diagnostic();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert!(diag.summary.starts_with("confluent_network"));
        assert!(diag.detail.is_some());

        let diag: Diagnostic = ProviderError::Cancelled.into();
        assert_eq!(diag.summary, "Operation cancelled");
        assert!(diag.detail.is_none());
    }
}
