//! The provider surface.
//!
//! [`ProviderService`] is the interface a host drives: schema discovery,
//! configuration, planning and the per-resource CRUD and import operations,
//! all over JSON values. [`ConfluentProvider`] implements it by dispatching to
//! the registry of resource kinds.
//!
//! Configuration happens once. Afterwards the [`ProviderContext`] is shared,
//! read-only, by every operation, so independent resources can be managed
//! concurrently. [`ProviderService::stop`] cancels every in-flight operation.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{ProviderConfig, ProviderContext};
use crate::error::ProviderError;
use crate::lifecycle::{self, DynResource};
use crate::mapper::{from_state, IdRef};
use crate::resources::{self, environment::Environment, kafka_cluster::KafkaCluster};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::types::{composite_id, ImportedResource, PlanResult, ProviderMetadata};
use crate::validation;
use crate::wait::WaitOptions;

const ENVIRONMENT: &str = "confluent_environment";
const KAFKA_CLUSTER: &str = "confluent_kafka_cluster";

/// Operations a provider host drives.
#[async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// The provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Resource and data source names, derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
        }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider, cancelling in-flight operations.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration without network calls.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource and return its full observed state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh a resource. `None` means it no longer exists.
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Update a resource in place and return its full observed state.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource and wait until it is gone.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import an existing object by its composite identifier.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::UnknownResource(format!(
            "import is not supported for {}",
            resource_type
        )))
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Look up an existing object.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

/// The managed streaming platform provider.
pub struct ConfluentProvider {
    resources: BTreeMap<&'static str, Box<dyn DynResource>>,
    context: OnceLock<Arc<ProviderContext>>,
    env_fallback: bool,
    shutdown: CancellationToken,
}

impl Default for ConfluentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfluentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfluentProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("configured", &self.context.get().is_some())
            .finish()
    }
}

impl ConfluentProvider {
    /// A provider with every resource kind at its default timing.
    pub fn new() -> Self {
        Self::from_registry(resources::registry(None))
    }

    /// A provider whose waits all use `options`, e.g. short intervals in tests.
    pub fn with_wait_options(options: WaitOptions) -> Self {
        Self::from_registry(resources::registry(Some(options)))
    }

    fn from_registry(registry: Vec<Box<dyn DynResource>>) -> Self {
        Self {
            resources: registry.into_iter().map(|r| (r.name(), r)).collect(),
            context: OnceLock::new(),
            env_fallback: true,
            shutdown: CancellationToken::new(),
        }
    }

    /// Ignore the `CONFLUENT_CLOUD_*` and `KAFKA_*` environment variables.
    pub fn without_env_fallback(mut self) -> Self {
        self.env_fallback = false;
        self
    }

    /// The context built by `configure`.
    pub fn context(&self) -> Result<&ProviderContext, ProviderError> {
        self.context.get().map(Arc::as_ref).ok_or_else(|| {
            ProviderError::Configuration("the provider has not been configured".to_string())
        })
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn DynResource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn parse_config(&self, config: Value) -> Result<ProviderConfig, ProviderError> {
        let config = ProviderConfig::from_value(config)?;
        Ok(if self.env_fallback {
            config.with_env_fallback()
        } else {
            config
        })
    }

    /// The import identifier a data source lookup resolves to.
    fn data_source_id(data_source_type: &str, config: &Value) -> Result<String, ProviderError> {
        #[derive(serde::Deserialize)]
        struct Lookup {
            id: String,
            #[serde(default)]
            environment: Vec<IdRef>,
        }

        let schema = Self::data_source_schema(data_source_type)?;
        validation::ensure_valid(&schema, config)?;
        let lookup: Lookup = from_state(config)?;
        Ok(match lookup.environment.first() {
            Some(environment) => composite_id(&[&environment.id, &lookup.id]),
            None => lookup.id,
        })
    }

    fn data_source_schema(data_source_type: &str) -> Result<Schema, ProviderError> {
        match data_source_type {
            ENVIRONMENT => Ok(Environment::data_source_schema()),
            KAFKA_CLUSTER => Ok(KafkaCluster::data_source_schema()),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

#[async_trait]
impl ProviderService for ConfluentProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = self
            .resources
            .iter()
            .fold(ProviderSchema::new(), |schema, (name, resource)| {
                schema.with_resource(*name, resource.schema())
            });
        schema
            .with_provider_config(ProviderConfig::schema())
            .with_data_source(ENVIRONMENT, Environment::data_source_schema())
            .with_data_source(KAFKA_CLUSTER, KafkaCluster::data_source_schema())
    }

    #[instrument(skip_all, name = "provider.validate_provider_config")]
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&ProviderConfig::schema(), &config);
        if diagnostics.is_empty() {
            if let Err(err) = self.parse_config(config).and_then(|c| c.validate()) {
                diagnostics.push(err.to_diagnostic());
            }
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all, name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        if self.context.get().is_some() {
            warn!("Provider already configured, ignoring new configuration");
            return Ok(vec![Diagnostic::warning("The provider is already configured")
                .with_detail("The configuration is fixed after the first configure call; the new one was ignored")]);
        }

        let context = match self.parse_config(config).and_then(ProviderContext::new) {
            Ok(context) => context,
            Err(err) => return Ok(vec![err.to_diagnostic()]),
        };
        let endpoint = context.client().endpoint().to_string();

        if self.context.set(Arc::new(context)).is_err() {
            warn!("Provider configured concurrently, keeping the first configuration");
        } else {
            info!(endpoint = %endpoint, "Provider configured");
        }
        Ok(vec![])
    }

    #[instrument(skip_all, name = "provider.stop")]
    async fn stop(&self) -> Result<(), ProviderError> {
        info!("Stopping provider, cancelling in-flight operations");
        self.shutdown.cancel();
        Ok(())
    }

    #[instrument(skip(self, config), name = "provider.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config), name = "provider.plan")]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(resource_type)?.schema();
        let plan = lifecycle::plan(&schema, prior_state.as_ref(), &proposed_state);
        debug!(
            changes = plan.changes.len(),
            requires_replace = plan.requires_replace,
            "Planned"
        );
        Ok(plan)
    }

    #[instrument(skip(self, planned_state), name = "provider.create")]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let cancel = self.shutdown.child_token();
        resource
            .create(self.context()?, &planned_state, &cancel)
            .await
    }

    #[instrument(skip(self, current_state), name = "provider.read")]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let cancel = self.shutdown.child_token();
        resource.read(self.context()?, &current_state, &cancel).await
    }

    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let cancel = self.shutdown.child_token();
        resource
            .update(self.context()?, &prior_state, &planned_state, &cancel)
            .await
    }

    #[instrument(skip(self, current_state), name = "provider.delete")]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let cancel = self.shutdown.child_token();
        resource.delete(self.context()?, &current_state, &cancel).await
    }

    #[instrument(skip(self), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let cancel = self.shutdown.child_token();
        let state = resource.import(self.context()?, id, &cancel).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    #[instrument(skip(self, config), name = "provider.read_data_source")]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let id = Self::data_source_id(data_source_type, &config)?;
        let resource = self.resource(data_source_type)?;
        let cancel = self.shutdown.child_token();
        resource.import(self.context()?, &id, &cancel).await
    }
}
