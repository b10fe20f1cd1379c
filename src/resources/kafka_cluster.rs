//! `confluent_kafka_cluster`: a managed Kafka cluster.
//!
//! The cluster type is chosen by setting exactly one of the `basic`,
//! `standard` or `dedicated` blocks. In place, a basic cluster may be upgraded
//! to standard and a dedicated cluster may be resized; any other type change
//! needs a new cluster.
//!
//! A dedicated resize is accepted immediately but applied over hours. The
//! cluster stays `PROVISIONED` throughout, so it only counts as stable once the
//! reported CKU count matches the requested one.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session, Transition};
use crate::mapper::{null_as_empty, ref_id, single, IdRef};
use crate::schema::{Attribute, Block, ExactlyOneOf, NestedBlock, Schema};
use crate::status::{LifecycleState, PhaseTable, StatusClassifier};
use crate::types::ImportKey;
use crate::wait::WaitOptions;

use super::{child_path, in_environment, one_of, Metadata, ObjectRef};

const PATH: &str = "/cmk/v2/clusters";
const CLOUDS: &[&str] = &["AWS", "AZURE", "GCP"];
const AVAILABILITIES: &[&str] = &["SINGLE_ZONE", "MULTI_ZONE"];

const KIND_BASIC: &str = "Basic";
const KIND_STANDARD: &str = "Standard";
const KIND_DEDICATED: &str = "Dedicated";

/// Cluster phases.
pub const PHASES: PhaseTable = PhaseTable::new(&[
    ("PROVISIONING", LifecycleState::Provisioning),
    ("PROVISIONED", LifecycleState::Stable),
    ("FAILED", LifecycleState::Failed),
    ("DEPROVISIONING", LifecycleState::Deprovisioning),
]);

/// The Kafka cluster resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaCluster;

/// Persisted state of a Kafka cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaClusterState {
    /// Cluster ID, e.g. `lkc-abc123`.
    #[serde(default)]
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// `SINGLE_ZONE` or `MULTI_ZONE`.
    pub availability: String,
    /// `AWS`, `AZURE` or `GCP`.
    pub cloud: String,
    /// Cloud region.
    pub region: String,
    /// Set for a basic cluster.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub basic: Vec<Basic>,
    /// Set for a standard cluster.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub standard: Vec<Standard>,
    /// Set for a dedicated cluster.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dedicated: Vec<Dedicated>,
    /// The owning environment.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment: Vec<IdRef>,
    /// The private network, for dedicated clusters.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub network: Vec<IdRef>,
    /// Bootstrap endpoint for Kafka clients.
    #[serde(default)]
    pub bootstrap_endpoint: String,
    /// Kafka REST endpoint.
    #[serde(default)]
    pub rest_endpoint: String,
    /// Confluent Resource Name.
    #[serde(default)]
    pub resource_name: String,
}

/// The `basic` block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Basic {}

/// The `standard` block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Standard {}

/// The `dedicated` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dedicated {
    /// Confluent Kafka Units.
    pub cku: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct ClusterConfig {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cku: Option<i64>,
}

impl ClusterConfig {
    fn from_local(local: &KafkaClusterState) -> Self {
        if let Some(dedicated) = single(&local.dedicated) {
            Self {
                kind: KIND_DEDICATED.to_string(),
                cku: Some(dedicated.cku),
            }
        } else if !local.standard.is_empty() {
            Self {
                kind: KIND_STANDARD.to_string(),
                cku: None,
            }
        } else {
            Self {
                kind: KIND_BASIC.to_string(),
                cku: None,
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ClusterSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    availability: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    cloud: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<ClusterConfig>,
    #[serde(default)]
    environment: ObjectRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    network: Option<ObjectRef>,
    #[serde(default, skip_serializing)]
    kafka_bootstrap_endpoint: String,
    #[serde(default, skip_serializing)]
    http_endpoint: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ClusterStatus {
    phase: String,
    #[serde(default)]
    cku: Option<i64>,
    #[serde(default)]
    error_message: Option<String>,
}

/// A cluster as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCluster {
    id: String,
    spec: ClusterSpec,
    status: ClusterStatus,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct ClusterRequest {
    spec: ClusterSpec,
}

impl ClusterRequest {
    fn create(local: &KafkaClusterState) -> Self {
        Self {
            spec: ClusterSpec {
                display_name: local.display_name.clone(),
                availability: local.availability.clone(),
                cloud: local.cloud.clone(),
                region: local.region.clone(),
                config: Some(ClusterConfig::from_local(local)),
                environment: ObjectRef::new(ref_id(&local.environment)),
                network: single(&local.network).map(|n| ObjectRef::new(n.id.clone())),
                ..Default::default()
            },
        }
    }

    fn update(local: &KafkaClusterState, changed: &[String]) -> Self {
        let type_changed = changed
            .iter()
            .any(|c| matches!(c.as_str(), "basic" | "standard" | "dedicated"));
        Self {
            spec: ClusterSpec {
                display_name: local.display_name.clone(),
                config: type_changed.then(|| ClusterConfig::from_local(local)),
                environment: ObjectRef::new(ref_id(&local.environment)),
                ..Default::default()
            },
        }
    }
}

fn id_block(force_new: bool, required: bool) -> NestedBlock {
    let block = Block::new().with_attribute("id", Attribute::required_string());
    let nested = if required {
        NestedBlock::required_single(block)
    } else {
        NestedBlock::single(block)
    };
    if force_new {
        nested.with_force_new()
    } else {
        nested
    }
}

fn item_path(local: &KafkaClusterState) -> String {
    in_environment(&child_path(PATH, &local.id), ref_id(&local.environment))
}

/// The cluster type reported by the server. Unknown or missing types are an error.
fn remote_kind(remote: &RemoteCluster) -> Result<&str, ProviderError> {
    let kind = remote
        .spec
        .config
        .as_ref()
        .map(|config| config.kind.as_str())
        .unwrap_or_default();
    match kind {
        KIND_BASIC | KIND_STANDARD | KIND_DEDICATED => Ok(kind),
        "" => Err(ProviderError::UnrecognizedStatus(
            "cluster has no type in spec.config.kind".to_string(),
        )),
        other => Err(ProviderError::UnrecognizedStatus(format!(
            "cluster type '{}'",
            other
        ))),
    }
}

fn cluster_type(local: &KafkaClusterState) -> &'static str {
    if !local.dedicated.is_empty() {
        KIND_DEDICATED
    } else if !local.standard.is_empty() {
        KIND_STANDARD
    } else {
        KIND_BASIC
    }
}

impl KafkaCluster {
    /// Schema of the `confluent_kafka_cluster` data source.
    pub fn data_source_schema() -> Schema {
        let computed = Attribute::computed_string;
        Schema::v0()
            .with_attribute("id", Attribute::required_string())
            .with_attribute("display_name", computed())
            .with_attribute("availability", computed())
            .with_attribute("cloud", computed())
            .with_attribute("region", computed())
            .with_attribute("bootstrap_endpoint", computed())
            .with_attribute("rest_endpoint", computed())
            .with_attribute("resource_name", computed())
            .with_block("environment", id_block(false, true))
            .with_block("basic", NestedBlock::single(Block::new()).computed())
            .with_block("standard", NestedBlock::single(Block::new()).computed())
            .with_block(
                "dedicated",
                NestedBlock::single(Block::new().with_attribute("cku", Attribute::computed_int64()))
                    .computed(),
            )
            .with_block("network", NestedBlock::single(Block::new().with_attribute("id", computed())).computed())
    }
}

#[async_trait]
impl ResourceKind for KafkaCluster {
    const NAME: &'static str = "confluent_kafka_cluster";
    type Local = KafkaClusterState;
    type Remote = RemoteCluster;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("display_name", Attribute::required_string())
            .with_attribute("availability", Attribute::required_string().with_force_new())
            .with_attribute("cloud", Attribute::required_string().with_force_new())
            .with_attribute("region", Attribute::required_string().with_force_new())
            .with_attribute("bootstrap_endpoint", Attribute::computed_string())
            .with_attribute("rest_endpoint", Attribute::computed_string())
            .with_attribute("resource_name", Attribute::computed_string())
            .with_block("basic", NestedBlock::single(Block::new()))
            .with_block("standard", NestedBlock::single(Block::new()))
            .with_block(
                "dedicated",
                NestedBlock::single(
                    Block::new().with_attribute(
                        "cku",
                        Attribute::required_int64().with_description("Number of CKUs"),
                    ),
                ),
            )
            .with_block("environment", id_block(true, true))
            .with_block("network", id_block(true, false))
            .with_exactly_one_of(ExactlyOneOf::new(["basic", "standard", "dedicated"]))
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["environment_id", "cluster_id"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["display_name", "basic", "standard", "dedicated"]
    }

    fn id(&self, local: &KafkaClusterState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> KafkaClusterState {
        KafkaClusterState {
            id: key.leaf().to_string(),
            display_name: String::new(),
            availability: String::new(),
            cloud: String::new(),
            region: String::new(),
            basic: Vec::new(),
            standard: Vec::new(),
            dedicated: Vec::new(),
            environment: vec![IdRef::new(key.segment("environment_id").unwrap_or_default())],
            network: Vec::new(),
            bootstrap_endpoint: String::new(),
            rest_endpoint: String::new(),
            resource_name: String::new(),
        }
    }

    fn classify(
        &self,
        remote: &RemoteCluster,
        expected: &KafkaClusterState,
    ) -> Result<LifecycleState, ProviderError> {
        remote_kind(remote)?;
        let state = PHASES.classify(&remote.status.phase)?;
        let resizing = single(&expected.dedicated)
            .zip(remote.status.cku)
            .is_some_and(|(dedicated, actual)| dedicated.cku != actual);
        if state == LifecycleState::Stable && resizing {
            return Ok(LifecycleState::Updating);
        }
        Ok(state)
    }

    fn failure_reason(&self, remote: &RemoteCluster) -> String {
        remote
            .status
            .error_message
            .clone()
            .unwrap_or_else(|| format!("cluster entered phase {}", remote.status.phase))
    }

    fn wait_options(&self, transition: Transition) -> WaitOptions {
        match transition {
            Transition::Create => {
                WaitOptions::new(Duration::from_secs(24 * 60 * 60), Duration::from_secs(10))
            }
            Transition::Update => {
                WaitOptions::new(Duration::from_secs(24 * 60 * 60), Duration::from_secs(30))
            }
            Transition::Delete => {
                WaitOptions::new(Duration::from_secs(60 * 60), Duration::from_secs(10))
            }
        }
    }

    fn validate_create(&self, desired: &KafkaClusterState) -> Result<(), ProviderError> {
        one_of("cloud", &desired.cloud, CLOUDS)?;
        one_of("availability", &desired.availability, AVAILABILITIES)?;
        if let Some(dedicated) = single(&desired.dedicated) {
            let minimum = if desired.availability == "MULTI_ZONE" { 2 } else { 1 };
            if dedicated.cku < minimum {
                return Err(ProviderError::Validation(format!(
                    "'dedicated.0.cku' must be at least {} for a {} cluster, got {}",
                    minimum, desired.availability, dedicated.cku
                )));
            }
        } else if !desired.network.is_empty() {
            return Err(ProviderError::Validation(
                "'network' can only be set for dedicated clusters".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_update(
        &self,
        prior: &KafkaClusterState,
        desired: &KafkaClusterState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        let (from, to) = (cluster_type(prior), cluster_type(desired));
        let allowed = from == to || (from == KIND_BASIC && to == KIND_STANDARD);
        if !allowed {
            return Err(ProviderError::Validation(format!(
                "a {} cluster cannot be changed to {} in place; only Basic to Standard upgrades are supported",
                from, to
            )));
        }
        self.validate_create(desired)
    }

    fn to_local(&self, remote: &RemoteCluster, prior: &KafkaClusterState) -> KafkaClusterState {
        let spec = &remote.spec;
        let config = spec.config.clone().unwrap_or_default();
        let (basic, standard, dedicated) = match config.kind.as_str() {
            KIND_DEDICATED => (
                Vec::new(),
                Vec::new(),
                vec![Dedicated {
                    cku: config.cku.or(remote.status.cku).unwrap_or_default(),
                }],
            ),
            KIND_STANDARD => (Vec::new(), vec![Standard {}], Vec::new()),
            KIND_BASIC => (vec![Basic {}], Vec::new(), Vec::new()),
            // Rejected by classify before any state is recorded
            _ => (Vec::new(), Vec::new(), Vec::new()),
        };

        KafkaClusterState {
            id: remote.id.clone(),
            display_name: spec.display_name.clone(),
            availability: spec.availability.clone(),
            cloud: spec.cloud.clone(),
            region: spec.region.clone(),
            basic,
            standard,
            dedicated,
            environment: if spec.environment.id.is_empty() {
                prior.environment.clone()
            } else {
                spec.environment.to_block()
            },
            network: spec
                .network
                .as_ref()
                .map(ObjectRef::to_block)
                .unwrap_or_default(),
            bootstrap_endpoint: spec.kafka_bootstrap_endpoint.clone(),
            rest_endpoint: spec.http_endpoint.clone(),
            resource_name: remote.metadata.resource_name.clone(),
        }
    }

    async fn create(
        &self,
        session: &Session<'_>,
        desired: &KafkaClusterState,
    ) -> Result<RemoteCluster, ProviderError> {
        session
            .client()
            .post(PATH, &ClusterRequest::create(desired))
            .await
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &KafkaClusterState,
    ) -> Result<RemoteCluster, ProviderError> {
        session.client().get(&item_path(local)).await
    }

    async fn update(
        &self,
        session: &Session<'_>,
        _prior: &KafkaClusterState,
        desired: &KafkaClusterState,
        changed: &[String],
    ) -> Result<(), ProviderError> {
        let _: serde_json::Value = session
            .client()
            .patch(
                &child_path(PATH, &desired.id),
                &ClusterRequest::update(desired, changed),
            )
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        session: &Session<'_>,
        local: &KafkaClusterState,
    ) -> Result<(), ProviderError> {
        session.client().delete(&item_path(local)).await
    }
}
