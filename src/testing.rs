//! Test harness for [`ProviderService`] implementations.
//!
//! [`ProviderTester`] drives a provider the way a host would, without any
//! transport in between, and adds apply/destroy helpers plus plan and
//! diagnostic assertions.
//!
//! ```ignore
//! use confluent_provider::testing::ProviderTester;
//! use confluent_provider::ConfluentProvider;
//! use serde_json::json;
//!
//! let tester = ProviderTester::new(ConfluentProvider::new());
//! tester.configure(json!({"cloud_api_key": "K", "cloud_api_secret": "S"})).await?;
//! let state = tester.apply("confluent_environment", json!({"display_name": "staging"})).await?;
//! tester.destroy("confluent_environment", state).await?;
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::ProviderError;
use crate::provider::ProviderService;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::types::{ImportedResource, PlanResult};

/// Drives a provider through complete operations.
#[derive(Debug)]
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate the provider configuration, failing on error diagnostics.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_provider_config(config).await?)
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.configure(config).await?)
    }

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Plan a new resource.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan a change to an existing resource.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Create a resource.
    pub async fn create(&self, resource_type: &str, config: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, config).await
    }

    /// Read a resource; `None` when it no longer exists.
    pub async fn read(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, state).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior_state, config).await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, state).await
    }

    /// Import a resource by its composite identifier.
    pub async fn import(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Look up a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Plan, create, then read back. Returns the refreshed state.
    pub async fn apply(&self, resource_type: &str, config: Value) -> Result<Value, TestError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.refresh(resource_type, created).await
    }

    /// Plan an in-place update, apply it, then read back.
    ///
    /// Fails without touching the resource if the plan requires replacement.
    pub async fn apply_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if plan.requires_replace {
            return Err(TestError::RequiresReplace(
                plan.changes
                    .iter()
                    .filter(|c| c.requires_replace)
                    .map(|c| c.path.clone())
                    .collect(),
            ));
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.refresh(resource_type, updated).await
    }

    /// Delete a resource and check it is gone.
    pub async fn destroy(&self, resource_type: &str, state: Value) -> Result<(), TestError> {
        self.delete(resource_type, state.clone()).await?;
        self.verify_destroyed(resource_type, state).await
    }

    /// Check that a deleted resource no longer exists.
    ///
    /// A read reporting the object gone, or failing with not-found, passes.
    /// Any other error is a failure: it says nothing about whether the
    /// object still exists.
    pub async fn verify_destroyed(&self, resource_type: &str, state: Value) -> Result<(), TestError> {
        match self.read(resource_type, state).await {
            Ok(None) => Ok(()),
            Ok(Some(state)) => Err(TestError::StillExists {
                resource_type: resource_type.to_string(),
                state,
            }),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(TestError::Provider(err)),
        }
    }

    async fn refresh(&self, resource_type: &str, state: Value) -> Result<Value, TestError> {
        self.read(resource_type, state)
            .await?
            .ok_or_else(|| TestError::Vanished(resource_type.to_string()))
    }
}

/// Why a test operation failed.
#[derive(Debug, Error)]
pub enum TestError {
    /// The provider returned error diagnostics.
    #[error("{}", describe(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The provider returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The plan replaces the resource where an in-place update was expected.
    #[error("Plan requires replacement because of: {}", .0.join(", "))]
    RequiresReplace(Vec<String>),

    /// A freshly written resource could not be read back.
    #[error("{0} disappeared right after it was written")]
    Vanished(String),

    /// A deleted resource can still be read.
    #[error("{resource_type} still exists after delete: {state}")]
    StillExists {
        /// The resource type.
        resource_type: String,
        /// The state read back.
        state: Value,
    },
}

fn describe(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {})", attr));
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan replaces the resource.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan changes `path`.
///
/// # Panics
///
/// Panics if `path` is not among the changes.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that at least one error diagnostic mentions `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.severity == DiagnosticSeverity::Error)
        .collect();
    assert!(
        errors.iter().any(|d| d.summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}
