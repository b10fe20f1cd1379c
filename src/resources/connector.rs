//! `confluent_connector`: a managed Kafka Connect connector.
//!
//! Configuration is split into `config_nonsensitive`, which is read back and
//! compared, and `config_sensitive`, which the server masks and is therefore
//! always taken from prior state. The connector name is the `name` entry of
//! the non-sensitive configuration.
//!
//! `status` drives pause and resume. A connector is stable once it reaches the
//! requested `RUNNING` or `PAUSED` state; `DEGRADED` counts as failed.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session, Transition};
use crate::mapper::{null_as_empty, ref_id, IdRef};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::status::{LifecycleState, PhaseTable, StatusClassifier};
use crate::types::{composite_id, ImportKey, ID_SEPARATOR};
use crate::wait::WaitOptions;

use super::child_path;

const RUNNING: &str = "RUNNING";
const PAUSED: &str = "PAUSED";

/// Value the server returns in place of a secret.
const MASKED: &str = "****************";

/// Entries the server adds to every connector's configuration.
const SERVER_INJECTED: &[&str] = &[
    "cloud.environment",
    "cloud.provider",
    "kafka.endpoint",
    "kafka.region",
];

/// Connector states.
pub const PHASES: PhaseTable = PhaseTable::new(&[
    ("PROVISIONING", LifecycleState::Provisioning),
    ("RUNNING", LifecycleState::Stable),
    ("PAUSED", LifecycleState::Stable),
    ("DEGRADED", LifecycleState::Failed),
    ("FAILED", LifecycleState::Failed),
]);

/// The connector resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connector;

/// Persisted state of a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorState {
    /// `<environment id>/<kafka cluster id>/<connector name>`.
    #[serde(default)]
    pub id: String,
    /// The owning environment.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environment: Vec<IdRef>,
    /// The Kafka cluster the connector runs against.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub kafka_cluster: Vec<IdRef>,
    /// Configuration read back from the server, including `name`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config_nonsensitive: BTreeMap<String, String>,
    /// Configuration the server masks, e.g. API secrets.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config_sensitive: BTreeMap<String, String>,
    /// `RUNNING` or `PAUSED`.
    #[serde(default)]
    pub status: String,
}

impl ConnectorState {
    /// The connector name: the configured `name`, else the last segment of the ID.
    pub fn name(&self) -> &str {
        match self.config_nonsensitive.get("name") {
            Some(name) => name,
            None => self.id.rsplit(ID_SEPARATOR).next().unwrap_or_default(),
        }
    }

    fn collection_path(&self) -> String {
        let environment = child_path("/connect/v1/environments", ref_id(&self.environment));
        let cluster = child_path(&format!("{}/clusters", environment), ref_id(&self.kafka_cluster));
        format!("{}/connectors", cluster)
    }

    fn item_path(&self) -> String {
        child_path(&self.collection_path(), self.name())
    }

    /// Both configuration maps, as the server expects them.
    fn full_config(&self) -> BTreeMap<String, String> {
        let mut config = self.config_nonsensitive.clone();
        config.extend(self.config_sensitive.clone());
        config
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConnectorStatus {
    state: String,
    #[serde(default)]
    trace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    name: String,
    connector: ConnectorStatus,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    config: BTreeMap<String, String>,
}

/// A connector with its state and configuration as returned by the API.
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    name: String,
    status: ConnectorStatus,
    config: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    config: BTreeMap<String, String>,
}

fn string_map(flags: AttributeFlags) -> Attribute {
    Attribute::new(AttributeType::string_map(), flags)
}

fn id_block() -> NestedBlock {
    NestedBlock::required_single(Block::new().with_attribute("id", Attribute::required_string()))
        .with_force_new()
}

#[async_trait]
impl ResourceKind for Connector {
    const NAME: &'static str = "confluent_connector";
    type Local = ConnectorState;
    type Remote = RemoteConnector;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "config_nonsensitive",
                string_map(AttributeFlags::required())
                    .with_description("Connector configuration, including 'name'"),
            )
            .with_attribute(
                "config_sensitive",
                string_map(AttributeFlags::optional()).sensitive(),
            )
            .with_attribute(
                "status",
                Attribute::optional_computed_string().with_description("RUNNING or PAUSED"),
            )
            .with_block("environment", id_block())
            .with_block("kafka_cluster", id_block())
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["environment_id", "kafka_cluster_id", "connector_name"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["config_nonsensitive", "config_sensitive", "status"]
    }

    fn id(&self, local: &ConnectorState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> ConnectorState {
        ConnectorState {
            id: key.to_id(),
            environment: vec![IdRef::new(key.segment("environment_id").unwrap_or_default())],
            kafka_cluster: vec![IdRef::new(key.segment("kafka_cluster_id").unwrap_or_default())],
            config_nonsensitive: BTreeMap::new(),
            config_sensitive: BTreeMap::new(),
            status: String::new(),
        }
    }

    fn classify(
        &self,
        remote: &RemoteConnector,
        expected: &ConnectorState,
    ) -> Result<LifecycleState, ProviderError> {
        let state = PHASES.classify(&remote.status.state)?;
        let pending = !expected.status.is_empty() && expected.status != remote.status.state;
        if state == LifecycleState::Stable && pending {
            return Ok(LifecycleState::Updating);
        }
        Ok(state)
    }

    fn failure_reason(&self, remote: &RemoteConnector) -> String {
        match remote.status.trace.as_deref() {
            Some(trace) if !trace.is_empty() => trace.to_string(),
            _ => format!("connector entered state {}", remote.status.state),
        }
    }

    fn wait_options(&self, transition: Transition) -> WaitOptions {
        match transition {
            Transition::Create => {
                WaitOptions::new(Duration::from_secs(60 * 60), Duration::from_secs(10))
            }
            Transition::Update => {
                WaitOptions::new(Duration::from_secs(30 * 60), Duration::from_secs(10))
            }
            Transition::Delete => {
                WaitOptions::new(Duration::from_secs(30 * 60), Duration::from_secs(5))
            }
        }
    }

    fn validate_create(&self, desired: &ConnectorState) -> Result<(), ProviderError> {
        if desired
            .config_nonsensitive
            .get("name")
            .map_or(true, |name| name.is_empty())
        {
            return Err(ProviderError::Validation(
                "'config_nonsensitive' must set 'name'".to_string(),
            ));
        }
        if let Some(key) = desired
            .config_nonsensitive
            .keys()
            .find(|key| desired.config_sensitive.contains_key(*key))
        {
            return Err(ProviderError::Validation(format!(
                "'{}' is set in both 'config_nonsensitive' and 'config_sensitive'",
                key
            )));
        }
        if !matches!(desired.status.as_str(), "" | RUNNING) {
            return Err(ProviderError::Validation(format!(
                "a connector is created in the RUNNING state; 'status' must be RUNNING or unset, got '{}'",
                desired.status
            )));
        }
        Ok(())
    }

    fn validate_update(
        &self,
        prior: &ConnectorState,
        desired: &ConnectorState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        if prior.name() != desired.name() {
            return Err(ProviderError::Validation(format!(
                "the connector name cannot be changed from '{}' to '{}'; the resource must be replaced",
                prior.name(),
                desired.name()
            )));
        }
        if !matches!(desired.status.as_str(), "" | RUNNING | PAUSED) {
            return Err(ProviderError::Validation(format!(
                "'status' must be RUNNING or PAUSED, got '{}'",
                desired.status
            )));
        }
        Ok(())
    }

    fn to_local(&self, remote: &RemoteConnector, prior: &ConnectorState) -> ConnectorState {
        let imported = prior.config_nonsensitive.is_empty();
        let config_nonsensitive = remote
            .config
            .iter()
            .filter(|(key, value)| {
                if imported {
                    value.as_str() != MASKED
                        && !SERVER_INJECTED.contains(&key.as_str())
                        && !prior.config_sensitive.contains_key(*key)
                } else {
                    prior.config_nonsensitive.contains_key(*key)
                }
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        ConnectorState {
            id: composite_id(&[
                ref_id(&prior.environment),
                ref_id(&prior.kafka_cluster),
                &remote.name,
            ]),
            environment: prior.environment.clone(),
            kafka_cluster: prior.kafka_cluster.clone(),
            config_nonsensitive,
            config_sensitive: prior.config_sensitive.clone(),
            status: remote.status.state.clone(),
        }
    }

    async fn create(
        &self,
        session: &Session<'_>,
        desired: &ConnectorState,
    ) -> Result<RemoteConnector, ProviderError> {
        let request = CreateRequest {
            name: desired.name(),
            config: desired.full_config(),
        };
        let created: CreateResponse = session
            .client()
            .post(&desired.collection_path(), &request)
            .await?;
        Ok(RemoteConnector {
            name: created.name,
            status: ConnectorStatus::default(),
            config: created.config,
        })
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &ConnectorState,
    ) -> Result<RemoteConnector, ProviderError> {
        let path = local.item_path();
        let status: StatusResponse = session.client().get(&format!("{}/status", path)).await?;
        let config: BTreeMap<String, String> =
            session.client().get(&format!("{}/config", path)).await?;
        Ok(RemoteConnector {
            name: status.name,
            status: status.connector,
            config,
        })
    }

    async fn update(
        &self,
        session: &Session<'_>,
        prior: &ConnectorState,
        desired: &ConnectorState,
        changed: &[String],
    ) -> Result<(), ProviderError> {
        let path = desired.item_path();

        if changed.iter().any(|c| c.starts_with("config_")) {
            session
                .client()
                .put(&format!("{}/config", path), Some(&desired.full_config()))
                .await?;
        }

        if changed.iter().any(|c| c == "status") && desired.status != prior.status {
            let action = match desired.status.as_str() {
                PAUSED => Some("pause"),
                RUNNING => Some("resume"),
                _ => None,
            };
            if let Some(action) = action {
                session
                    .client()
                    .put::<()>(&format!("{}/{}", path, action), None)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        session: &Session<'_>,
        local: &ConnectorState,
    ) -> Result<(), ProviderError> {
        session.client().delete(&local.item_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn local(status: &str) -> ConnectorState {
        ConnectorState {
            id: "env-1/lkc-1/orders-sink".to_string(),
            environment: vec![IdRef::new("env-1")],
            kafka_cluster: vec![IdRef::new("lkc-1")],
            config_nonsensitive: BTreeMap::from([
                ("name".to_string(), "orders-sink".to_string()),
                ("connector.class".to_string(), "S3_SINK".to_string()),
                ("topics".to_string(), "orders".to_string()),
            ]),
            config_sensitive: BTreeMap::from([(
                "aws.secret.access.key".to_string(),
                "s3cret".to_string(),
            )]),
            status: status.to_string(),
        }
    }

    fn remote(state: &str) -> RemoteConnector {
        let status: StatusResponse = serde_json::from_value(json!({
            "name": "orders-sink",
            "connector": {"state": state, "worker_id": "orders-sink", "trace": ""},
            "tasks": [],
            "type": "sink"
        }))
        .unwrap();
        let config: BTreeMap<String, String> = serde_json::from_value(json!({
            "name": "orders-sink",
            "connector.class": "S3_SINK",
            "topics": "orders",
            "aws.secret.access.key": MASKED,
            "cloud.environment": "prod",
            "kafka.endpoint": "SASL_SSL://pkc-1:9092"
        }))
        .unwrap();
        RemoteConnector {
            name: status.name,
            status: status.connector,
            config,
        }
    }

    #[test]
    fn test_paths() {
        let connector = local("");
        assert_eq!(
            connector.item_path(),
            "/connect/v1/environments/env-1/clusters/lkc-1/connectors/orders-sink"
        );
    }

    #[test]
    fn test_imported_name_is_encoded_in_paths() {
        let key = ImportKey::parse("env-1/lkc-1/orders sink?expand=1", Connector.import_key()).unwrap();
        let seeded = Connector.from_import(&key);
        assert_eq!(
            seeded.item_path(),
            "/connect/v1/environments/env-1/clusters/lkc-1/connectors/orders%20sink%3Fexpand%3D1"
        );
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let key = ImportKey::parse("env-1/lkc-1/orders-sink", Connector.import_key()).unwrap();
        let seeded = Connector.from_import(&key);
        assert_eq!(seeded.id, "env-1/lkc-1/orders-sink");
        assert_eq!(seeded.name(), "orders-sink");
    }

    #[test]
    fn test_full_config_merges_sensitive() {
        let config = local("").full_config();
        assert_eq!(config["aws.secret.access.key"], "s3cret");
        assert_eq!(config["name"], "orders-sink");
    }

    #[test]
    fn test_to_local_keeps_configured_keys_and_secrets() {
        let prior = local("RUNNING");
        let observed = Connector.to_local(&remote("RUNNING"), &prior);
        assert_eq!(observed, prior);
    }

    #[test]
    fn test_to_local_on_import_drops_masked_and_injected() {
        let key = ImportKey::parse("env-1/lkc-1/orders-sink", Connector.import_key()).unwrap();
        let seeded = Connector.from_import(&key);
        let observed = Connector.to_local(&remote("PAUSED"), &seeded);
        assert_eq!(
            observed.config_nonsensitive.keys().collect::<Vec<_>>(),
            vec!["connector.class", "name", "topics"]
        );
        assert!(observed.config_sensitive.is_empty());
        assert_eq!(observed.status, "PAUSED");
    }

    #[test]
    fn test_classify_waits_for_requested_status() {
        assert_eq!(
            Connector.classify(&remote("RUNNING"), &local("PAUSED")).unwrap(),
            LifecycleState::Updating
        );
        assert_eq!(
            Connector.classify(&remote("PAUSED"), &local("PAUSED")).unwrap(),
            LifecycleState::Stable
        );
        assert_eq!(
            Connector.classify(&remote("RUNNING"), &local("")).unwrap(),
            LifecycleState::Stable
        );
        assert_eq!(
            Connector.classify(&remote("DEGRADED"), &local("RUNNING")).unwrap(),
            LifecycleState::Failed
        );
        let err = Connector.classify(&remote("UNASSIGNED"), &local("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnrecognizedStatus);
    }

    #[test]
    fn test_failure_reason_uses_trace() {
        let mut failed = remote("FAILED");
        assert_eq!(Connector.failure_reason(&failed), "connector entered state FAILED");
        failed.status.trace = Some("Invalid AWS credentials".to_string());
        assert_eq!(Connector.failure_reason(&failed), "Invalid AWS credentials");
    }

    #[test]
    fn test_validate_create() {
        assert!(Connector.validate_create(&local("")).is_ok());
        assert!(Connector.validate_create(&local("RUNNING")).is_ok());
        assert!(Connector.validate_create(&local("PAUSED")).is_err());

        let mut unnamed = local("");
        unnamed.config_nonsensitive.remove("name");
        assert!(Connector.validate_create(&unnamed).is_err());

        let mut overlapping = local("");
        overlapping
            .config_nonsensitive
            .insert("aws.secret.access.key".to_string(), "x".to_string());
        let err = Connector.validate_create(&overlapping).unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_rename_rejected() {
        let prior = local("RUNNING");
        let mut renamed = local("RUNNING");
        renamed
            .config_nonsensitive
            .insert("name".to_string(), "orders-sink-v2".to_string());
        let err = Connector.validate_update(&prior, &renamed, &[]).unwrap_err();
        assert!(err.to_string().contains("cannot be changed"));
        assert!(Connector.validate_update(&prior, &local("PAUSED"), &[]).is_ok());
    }

    #[test]
    fn test_sensitive_config_is_flagged() {
        let schema = Connector.schema();
        assert!(schema.block.attributes["config_sensitive"].flags.sensitive);
        assert!(!schema.block.attributes["config_nonsensitive"].flags.sensitive);
    }
}
