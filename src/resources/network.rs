//! `confluent_network`: private networking for dedicated clusters.
//!
//! Networks are provisioned asynchronously and can take tens of minutes to
//! become `READY`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session, Transition};
use crate::mapper::{null_as_empty, ref_id, IdRef};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::status::{LifecycleState, PhaseTable, StatusClassifier};
use crate::types::ImportKey;
use crate::wait::WaitOptions;

use super::{child_path, in_environment, one_of, Metadata, ObjectRef, PhaseStatus};

const PATH: &str = "/networking/v1/networks";
const CLOUDS: &[&str] = &["AWS", "AZURE", "GCP"];
const CONNECTION_TYPES: &[&str] = &["PEERING", "TRANSITGATEWAY", "PRIVATELINK"];

/// Network phases.
pub const PHASES: PhaseTable = PhaseTable::new(&[
    ("PROVISIONING", LifecycleState::Provisioning),
    ("READY", LifecycleState::Stable),
    ("FAILED", LifecycleState::Failed),
    ("DEPROVISIONING", LifecycleState::Deprovisioning),
]);

/// The network resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Network;

/// Persisted state of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    /// Network ID, e.g. `n-abc123`.
    #[serde(default)]
    pub id: String,
    /// Human-readable name. Defaults to the ID.
    #[serde(default)]
    pub display_name: String,
    /// `AWS`, `AZURE` or `GCP`.
    pub cloud: String,
    /// Cloud region.
    pub region: String,
    /// Allowed connection types.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub connection_types: Vec<String>,
    /// IPv4 CIDR block. Chosen by the server when unset.
    #[serde(default)]
    pub cidr: String,
    /// Availability zones. Chosen by the server when unset.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zones: Vec<String>,
    /// The owning environment.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment: Vec<IdRef>,
    /// Confluent Resource Name.
    #[serde(default)]
    pub resource_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NetworkSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    cloud: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    region: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    connection_types: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    cidr: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_empty")]
    zones: Vec<String>,
    #[serde(default)]
    environment: ObjectRef,
}

/// A network as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteNetwork {
    id: String,
    spec: NetworkSpec,
    status: PhaseStatus,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct NetworkRequest {
    spec: NetworkSpec,
}

impl NetworkRequest {
    fn create(local: &NetworkState) -> Self {
        Self {
            spec: NetworkSpec {
                display_name: local.display_name.clone(),
                cloud: local.cloud.clone(),
                region: local.region.clone(),
                connection_types: local.connection_types.clone(),
                cidr: local.cidr.clone(),
                zones: local.zones.clone(),
                environment: ObjectRef::new(ref_id(&local.environment)),
            },
        }
    }

    fn rename(local: &NetworkState) -> Self {
        Self {
            spec: NetworkSpec {
                display_name: local.display_name.clone(),
                environment: ObjectRef::new(ref_id(&local.environment)),
                ..Default::default()
            },
        }
    }
}

fn environment_block() -> NestedBlock {
    NestedBlock::required_single(Block::new().with_attribute("id", Attribute::required_string()))
        .with_force_new()
}

fn string_set(flags: AttributeFlags) -> Attribute {
    Attribute::new(AttributeType::string_set(), flags)
}

fn item_path(local: &NetworkState) -> String {
    in_environment(&child_path(PATH, &local.id), ref_id(&local.environment))
}

#[async_trait]
impl ResourceKind for Network {
    const NAME: &'static str = "confluent_network";
    type Local = NetworkState;
    type Remote = RemoteNetwork;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("display_name", Attribute::optional_computed_string())
            .with_attribute("cloud", Attribute::required_string().with_force_new())
            .with_attribute("region", Attribute::required_string().with_force_new())
            .with_attribute(
                "connection_types",
                string_set(AttributeFlags::required()).with_force_new(),
            )
            .with_attribute("cidr", Attribute::optional_computed_string().with_force_new())
            .with_attribute(
                "zones",
                string_set(AttributeFlags::optional_computed()).with_force_new(),
            )
            .with_attribute("resource_name", Attribute::computed_string())
            .with_block("environment", environment_block())
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["environment_id", "network_id"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["display_name"]
    }

    fn id(&self, local: &NetworkState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> NetworkState {
        NetworkState {
            id: key.leaf().to_string(),
            display_name: String::new(),
            cloud: String::new(),
            region: String::new(),
            connection_types: Vec::new(),
            cidr: String::new(),
            zones: Vec::new(),
            environment: vec![IdRef::new(key.segment("environment_id").unwrap_or_default())],
            resource_name: String::new(),
        }
    }

    fn classify(
        &self,
        remote: &RemoteNetwork,
        _expected: &NetworkState,
    ) -> Result<LifecycleState, ProviderError> {
        PHASES.classify(&remote.status.phase)
    }

    fn failure_reason(&self, remote: &RemoteNetwork) -> String {
        remote.status.failure_reason()
    }

    fn wait_options(&self, transition: Transition) -> WaitOptions {
        match transition {
            Transition::Create | Transition::Delete => {
                WaitOptions::new(Duration::from_secs(60 * 60), Duration::from_secs(30))
            }
            Transition::Update => {
                WaitOptions::new(Duration::from_secs(20 * 60), Duration::from_secs(10))
            }
        }
    }

    fn validate_create(&self, desired: &NetworkState) -> Result<(), ProviderError> {
        one_of("cloud", &desired.cloud, CLOUDS)?;
        if desired.connection_types.is_empty() {
            return Err(ProviderError::Validation(
                "'connection_types' must contain at least one entry".to_string(),
            ));
        }
        for connection_type in &desired.connection_types {
            one_of("connection_types", connection_type, CONNECTION_TYPES)?;
        }
        Ok(())
    }

    fn to_local(&self, remote: &RemoteNetwork, prior: &NetworkState) -> NetworkState {
        let mut connection_types = remote.spec.connection_types.clone();
        connection_types.sort();
        let mut zones = remote.spec.zones.clone();
        zones.sort();

        NetworkState {
            id: remote.id.clone(),
            display_name: remote.spec.display_name.clone(),
            cloud: remote.spec.cloud.clone(),
            region: remote.spec.region.clone(),
            connection_types,
            cidr: remote.spec.cidr.clone(),
            zones,
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
        desired: &NetworkState,
    ) -> Result<RemoteNetwork, ProviderError> {
        session
            .client()
            .post(PATH, &NetworkRequest::create(desired))
            .await
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &NetworkState,
    ) -> Result<RemoteNetwork, ProviderError> {
        session.client().get(&item_path(local)).await
    }

    async fn update(
        &self,
        session: &Session<'_>,
        _prior: &NetworkState,
        desired: &NetworkState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        let _: serde_json::Value = session
            .client()
            .patch(
                &child_path(PATH, &desired.id),
                &NetworkRequest::rename(desired),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, session: &Session<'_>, local: &NetworkState) -> Result<(), ProviderError> {
        session.client().delete(&item_path(local)).await
    }
}
