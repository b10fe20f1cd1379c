//! `confluent_flink_compute_pool`: a pool of Flink compute units (CFUs).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session, Transition};
use crate::mapper::{null_as_empty, ref_id, IdRef};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::status::{LifecycleState, PhaseTable, StatusClassifier};
use crate::types::ImportKey;
use crate::wait::WaitOptions;

use super::{child_path, in_environment, one_of, Metadata, ObjectRef, PhaseStatus};

const PATH: &str = "/fcpm/v2/compute-pools";
const CLOUDS: &[&str] = &["AWS", "AZURE", "GCP"];
const MAX_CFU_VALUES: &[i64] = &[5, 10, 20, 30, 40, 50];

/// Compute pool phases.
pub const PHASES: PhaseTable = PhaseTable::new(&[
    ("PROVISIONING", LifecycleState::Provisioning),
    ("PROVISIONED", LifecycleState::Stable),
    ("FAILED", LifecycleState::Failed),
    ("DEPROVISIONING", LifecycleState::Deprovisioning),
]);

/// The Flink compute pool resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlinkComputePool;

/// Persisted state of a compute pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlinkComputePoolState {
    /// Pool ID, e.g. `lfcp-abc123`.
    #[serde(default)]
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// `AWS`, `AZURE` or `GCP`.
    pub cloud: String,
    /// Cloud region.
    pub region: String,
    /// Upper bound on CFUs the pool scales to.
    #[serde(default)]
    pub max_cfu: Option<i64>,
    /// The owning environment.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment: Vec<IdRef>,
    /// Confluent Resource Name.
    #[serde(default)]
    pub resource_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PoolSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    cloud: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_cfu: Option<i64>,
    #[serde(default)]
    environment: ObjectRef,
}

/// A compute pool as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePool {
    id: String,
    spec: PoolSpec,
    status: PhaseStatus,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct PoolRequest {
    spec: PoolSpec,
}

impl PoolRequest {
    fn create(local: &FlinkComputePoolState) -> Self {
        Self {
            spec: PoolSpec {
                display_name: local.display_name.clone(),
                cloud: local.cloud.clone(),
                region: local.region.clone(),
                max_cfu: local.max_cfu,
                environment: ObjectRef::new(ref_id(&local.environment)),
            },
        }
    }

    fn update(local: &FlinkComputePoolState, changed: &[String]) -> Self {
        let has = |name: &str| changed.iter().any(|c| c == name);
        Self {
            spec: PoolSpec {
                display_name: if has("display_name") {
                    local.display_name.clone()
                } else {
                    String::new()
                },
                max_cfu: local.max_cfu.filter(|_| has("max_cfu")),
                environment: ObjectRef::new(ref_id(&local.environment)),
                ..Default::default()
            },
        }
    }
}

fn item_path(local: &FlinkComputePoolState) -> String {
    in_environment(&child_path(PATH, &local.id), ref_id(&local.environment))
}

#[async_trait]
impl ResourceKind for FlinkComputePool {
    const NAME: &'static str = "confluent_flink_compute_pool";
    type Local = FlinkComputePoolState;
    type Remote = RemotePool;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("display_name", Attribute::required_string())
            .with_attribute("cloud", Attribute::required_string().with_force_new())
            .with_attribute("region", Attribute::required_string().with_force_new())
            .with_attribute(
                "max_cfu",
                Attribute::optional_computed_int64().with_description("One of 5, 10, 20, 30, 40, 50"),
            )
            .with_attribute("resource_name", Attribute::computed_string())
            .with_block(
                "environment",
                NestedBlock::required_single(
                    Block::new().with_attribute("id", Attribute::required_string()),
                )
                .with_force_new(),
            )
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["environment_id", "compute_pool_id"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["display_name", "max_cfu"]
    }

    fn id(&self, local: &FlinkComputePoolState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> FlinkComputePoolState {
        FlinkComputePoolState {
            id: key.leaf().to_string(),
            display_name: String::new(),
            cloud: String::new(),
            region: String::new(),
            max_cfu: None,
            environment: vec![IdRef::new(key.segment("environment_id").unwrap_or_default())],
            resource_name: String::new(),
        }
    }

    fn classify(
        &self,
        remote: &RemotePool,
        _expected: &FlinkComputePoolState,
    ) -> Result<LifecycleState, ProviderError> {
        PHASES.classify(&remote.status.phase)
    }

    fn failure_reason(&self, remote: &RemotePool) -> String {
        remote.status.failure_reason()
    }

    fn wait_options(&self, _transition: Transition) -> WaitOptions {
        WaitOptions::new(Duration::from_secs(20 * 60), Duration::from_secs(5))
    }

    fn validate_create(&self, desired: &FlinkComputePoolState) -> Result<(), ProviderError> {
        one_of("cloud", &desired.cloud, CLOUDS)?;
        match desired.max_cfu {
            Some(max_cfu) if !MAX_CFU_VALUES.contains(&max_cfu) => {
                Err(ProviderError::Validation(format!(
                    "'max_cfu' must be one of 5, 10, 20, 30, 40, 50, got {}",
                    max_cfu
                )))
            }
            _ => Ok(()),
        }
    }

    fn validate_update(
        &self,
        _prior: &FlinkComputePoolState,
        desired: &FlinkComputePoolState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        self.validate_create(desired)
    }

    fn to_local(&self, remote: &RemotePool, prior: &FlinkComputePoolState) -> FlinkComputePoolState {
        FlinkComputePoolState {
            id: remote.id.clone(),
            display_name: remote.spec.display_name.clone(),
            cloud: remote.spec.cloud.clone(),
            region: remote.spec.region.clone(),
            max_cfu: remote.spec.max_cfu,
            environment: if remote.spec.environment.id.is_empty() {
                prior.environment.clone()
            } else {
                remote.spec.environment.to_block()
            },
            resource_name: remote.metadata.resource_name.clone(),
        }
    }

    async fn create(
        &self,
        session: &Session<'_>,
        desired: &FlinkComputePoolState,
    ) -> Result<RemotePool, ProviderError> {
        session
            .client()
            .post(PATH, &PoolRequest::create(desired))
            .await
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &FlinkComputePoolState,
    ) -> Result<RemotePool, ProviderError> {
        session.client().get(&item_path(local)).await
    }

    async fn update(
        &self,
        session: &Session<'_>,
        _prior: &FlinkComputePoolState,
        desired: &FlinkComputePoolState,
        changed: &[String],
    ) -> Result<(), ProviderError> {
        let _: serde_json::Value = session
            .client()
            .patch(
                &child_path(PATH, &desired.id),
                &PoolRequest::update(desired, changed),
            )
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        session: &Session<'_>,
        local: &FlinkComputePoolState,
    ) -> Result<(), ProviderError> {
        session.client().delete(&item_path(local)).await
    }
}
