//! Lifecycle states and classification of remote status strings.
//!
//! Each resource kind reports progress through its own status vocabulary
//! (`PROVISIONING`, `READY`, `PROVISIONED`, `RUNNING`, ...). A
//! [`StatusClassifier`] reduces that vocabulary to the fixed
//! [`LifecycleState`] taxonomy the polling engine understands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// The lifecycle state of a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// The object is being created asynchronously.
    Provisioning,
    /// The object exists and is usable.
    Stable,
    /// A mutation is being applied asynchronously.
    Updating,
    /// The object is being torn down.
    Deprovisioning,
    /// The object no longer exists.
    Deleted,
    /// The object reached a terminal failure.
    Failed,
}

impl LifecycleState {
    /// The lowercase name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Stable => "stable",
            Self::Updating => "updating",
            Self::Deprovisioning => "deprovisioning",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        }
    }

    /// Whether the object is still moving between states.
    pub fn is_transitional(&self) -> bool {
        matches!(
            self,
            Self::Provisioning | Self::Updating | Self::Deprovisioning
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a raw remote status string to a [`LifecycleState`].
///
/// Implementations must be total over the statuses the API can return and
/// must reject anything else: a status introduced server-side must never be
/// mistaken for a stable one.
pub trait StatusClassifier: Send + Sync {
    /// Classify a status string.
    fn classify(&self, status: &str) -> Result<LifecycleState, ProviderError>;
}

/// A classifier for resource kinds whose create call is synchronous.
///
/// Any successfully read object is [`LifecycleState::Stable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysStable;

impl StatusClassifier for AlwaysStable {
    fn classify(&self, _status: &str) -> Result<LifecycleState, ProviderError> {
        Ok(LifecycleState::Stable)
    }
}

/// A classifier backed by a fixed table of `(status, state)` pairs.
///
/// Lookups are exact and case-sensitive.
///
/// # Example
///
/// ```
/// use confluent_provider::status::{LifecycleState, PhaseTable, StatusClassifier};
///
/// const PHASES: PhaseTable = PhaseTable::new(&[
///     ("PROVISIONING", LifecycleState::Provisioning),
///     ("READY", LifecycleState::Stable),
/// ]);
///
/// assert_eq!(PHASES.classify("READY").unwrap(), LifecycleState::Stable);
/// assert!(PHASES.classify("ready").is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PhaseTable {
    entries: &'static [(&'static str, LifecycleState)],
}

impl PhaseTable {
    /// Create a classifier from a static table.
    pub const fn new(entries: &'static [(&'static str, LifecycleState)]) -> Self {
        Self { entries }
    }

    /// The statuses this table recognizes.
    pub fn statuses(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(status, _)| *status)
    }
}

impl StatusClassifier for PhaseTable {
    fn classify(&self, status: &str) -> Result<LifecycleState, ProviderError> {
        self.entries
            .iter()
            .find(|(known, _)| *known == status)
            .map(|(_, state)| *state)
            .ok_or_else(|| {
                ProviderError::UnrecognizedStatus(format!(
                    "'{}' (expected one of: {})",
                    status,
                    self.statuses().collect::<Vec<_>>().join(", ")
                ))
            })
    }
}
