//! `confluent_kafka_topic`: a topic on a Kafka cluster.
//!
//! Topics live behind the cluster's own REST endpoint, not the Cloud API, and
//! are authenticated with a cluster API key. The cluster, endpoint and key
//! come from the resource's `kafka_cluster`, `rest_endpoint` and `credentials`
//! when set, else from the provider's Kafka settings.
//!
//! Only dynamic topic configuration, i.e. what was explicitly set on the
//! topic, is kept in state. Broker defaults never show up as drift.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Credentials, ProviderContext};
use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session};
use crate::mapper::{null_as_empty, ref_id, single, IdRef};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};
use crate::status::{AlwaysStable, LifecycleState, StatusClassifier};
use crate::types::{composite_id, ImportKey};

use super::child_path;

/// Partitions used when the configuration does not set a count.
pub const DEFAULT_PARTITIONS: i64 = 6;

const DYNAMIC_TOPIC_CONFIG: &str = "DYNAMIC_TOPIC_CONFIG";

/// The Kafka topic resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaTopic;

/// Persisted state of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaTopicState {
    /// `<cluster id>/<topic name>`.
    #[serde(default)]
    pub id: String,
    /// Topic name.
    pub topic_name: String,
    /// Number of partitions.
    #[serde(default)]
    pub partitions_count: Option<i64>,
    /// Explicitly set topic configuration.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config: BTreeMap<String, String>,
    /// The cluster, when not taken from the provider settings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub kafka_cluster: Vec<IdRef>,
    /// Cluster REST endpoint, when not taken from the provider settings.
    #[serde(default)]
    pub rest_endpoint: String,
    /// Cluster API key, when not taken from the provider settings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub credentials: Vec<Credentials>,
}

#[derive(Debug, Clone, Deserialize)]
struct TopicData {
    cluster_id: String,
    topic_name: String,
    partitions_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigEntry {
    name: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Deserialize)]
struct ConfigList {
    #[serde(default)]
    data: Vec<ConfigEntry>,
}

/// A topic and its configuration as returned by the cluster.
#[derive(Debug, Clone)]
pub struct RemoteTopic {
    topic: TopicData,
    configs: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
struct NameValue<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTopicRequest<'a> {
    topic_name: &'a str,
    partitions_count: i64,
    configs: Vec<NameValue<'a>>,
}

#[derive(Debug, Serialize)]
struct PartitionsRequest {
    partitions_count: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct AlterEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct AlterRequest<'a> {
    data: Vec<AlterEntry<'a>>,
}

/// Entries that move `prior` config to `desired`. Removed keys revert to the default.
fn config_changes<'a>(
    prior: &'a BTreeMap<String, String>,
    desired: &'a BTreeMap<String, String>,
) -> Vec<AlterEntry<'a>> {
    let set = desired
        .iter()
        .filter(|(name, value)| prior.get(*name) != Some(*value))
        .map(|(name, value)| AlterEntry {
            name,
            value: Some(value),
            operation: None,
        });
    let reset = prior
        .keys()
        .filter(|name| !desired.contains_key(*name))
        .map(|name| AlterEntry {
            name,
            value: None,
            operation: Some("DELETE"),
        });
    set.chain(reset).collect()
}

/// `{endpoint}/kafka/v3/clusters/{cluster}/topics`, from the resource or the provider settings.
fn topics_url(ctx: &ProviderContext, local: &KafkaTopicState) -> Result<String, ProviderError> {
    let scope = ctx.kafka();
    let cluster = match ref_id(&local.kafka_cluster) {
        "" => scope.cluster_id.as_deref().unwrap_or_default(),
        id => id,
    };
    let endpoint = match local.rest_endpoint.as_str() {
        "" => scope.rest_endpoint.as_deref().unwrap_or_default(),
        endpoint => endpoint,
    };
    if cluster.is_empty() {
        return Err(ProviderError::Validation(
            "the Kafka cluster is not set: set 'kafka_cluster' or the provider's 'kafka_id'".to_string(),
        ));
    }
    if endpoint.is_empty() {
        return Err(ProviderError::Validation(
            "the Kafka REST endpoint is not set: set 'rest_endpoint' or the provider's 'kafka_rest_endpoint'"
                .to_string(),
        ));
    }
    let cluster = child_path(
        &format!("{}/kafka/v3/clusters", endpoint.trim_end_matches('/')),
        cluster,
    );
    Ok(format!("{}/topics", cluster))
}

fn topic_url(ctx: &ProviderContext, local: &KafkaTopicState) -> Result<String, ProviderError> {
    Ok(child_path(&topics_url(ctx, local)?, &local.topic_name))
}

#[async_trait]
impl ResourceKind for KafkaTopic {
    const NAME: &'static str = "confluent_kafka_topic";
    type Local = KafkaTopicState;
    type Remote = RemoteTopic;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("topic_name", Attribute::required_string().with_force_new())
            .with_attribute(
                "partitions_count",
                Attribute::optional_computed_int64()
                    .with_description("Number of partitions; can only be increased"),
            )
            .with_attribute(
                "config",
                Attribute::new(AttributeType::string_map(), AttributeFlags::optional()),
            )
            .with_attribute(
                "rest_endpoint",
                Attribute::optional_computed_string().with_force_new(),
            )
            .with_block(
                "kafka_cluster",
                NestedBlock::single(Block::new().with_attribute("id", Attribute::required_string()))
                    .with_force_new()
                    .computed(),
            )
            .with_block(
                "credentials",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("key", Attribute::required_string().sensitive())
                        .with_attribute("secret", Attribute::required_string().sensitive()),
                ),
            )
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["kafka_cluster_id", "topic_name"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["partitions_count", "config", "credentials"]
    }

    fn id(&self, local: &KafkaTopicState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> KafkaTopicState {
        KafkaTopicState {
            id: String::new(),
            topic_name: key.leaf().to_string(),
            partitions_count: None,
            config: BTreeMap::new(),
            kafka_cluster: vec![IdRef::new(key.segment("kafka_cluster_id").unwrap_or_default())],
            rest_endpoint: String::new(),
            credentials: Vec::new(),
        }
    }

    fn classify(
        &self,
        _remote: &RemoteTopic,
        _expected: &KafkaTopicState,
    ) -> Result<LifecycleState, ProviderError> {
        AlwaysStable.classify("")
    }

    fn credentials<'a>(
        &self,
        ctx: &'a ProviderContext,
        local: &'a KafkaTopicState,
    ) -> Option<&'a Credentials> {
        Credentials::resolve(single(&local.credentials), ctx.kafka().credentials.as_ref())
    }

    fn validate_create(&self, desired: &KafkaTopicState) -> Result<(), ProviderError> {
        if let Some(count) = desired.partitions_count {
            if count < 1 {
                return Err(ProviderError::Validation(format!(
                    "'partitions_count' must be at least 1, got {}",
                    count
                )));
            }
        }
        Ok(())
    }

    fn validate_update(
        &self,
        prior: &KafkaTopicState,
        desired: &KafkaTopicState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        if let (Some(before), Some(after)) = (prior.partitions_count, desired.partitions_count) {
            if after < before {
                return Err(ProviderError::Validation(format!(
                    "'partitions_count' can only be increased, from {} to {} was requested",
                    before, after
                )));
            }
        }
        Ok(())
    }

    fn to_local(&self, remote: &RemoteTopic, prior: &KafkaTopicState) -> KafkaTopicState {
        let config = remote
            .configs
            .iter()
            .filter(|entry| entry.source == DYNAMIC_TOPIC_CONFIG)
            .filter_map(|entry| {
                // Sensitive values come back null; keep what was configured
                let value = entry
                    .value
                    .clone()
                    .or_else(|| prior.config.get(&entry.name).cloned())?;
                Some((entry.name.clone(), value))
            })
            .collect();

        KafkaTopicState {
            id: composite_id(&[&remote.topic.cluster_id, &remote.topic.topic_name]),
            topic_name: remote.topic.topic_name.clone(),
            partitions_count: Some(remote.topic.partitions_count),
            config,
            kafka_cluster: if prior.kafka_cluster.is_empty() {
                Vec::new()
            } else {
                vec![IdRef::new(remote.topic.cluster_id.clone())]
            },
            rest_endpoint: prior.rest_endpoint.clone(),
            credentials: prior.credentials.clone(),
        }
    }

    async fn create(
        &self,
        session: &Session<'_>,
        desired: &KafkaTopicState,
    ) -> Result<RemoteTopic, ProviderError> {
        let request = CreateTopicRequest {
            topic_name: &desired.topic_name,
            partitions_count: desired.partitions_count.unwrap_or(DEFAULT_PARTITIONS),
            configs: desired
                .config
                .iter()
                .map(|(name, value)| NameValue { name, value })
                .collect(),
        };
        let topic: TopicData = session
            .client()
            .post(&topics_url(session.ctx(), desired)?, &request)
            .await?;
        Ok(RemoteTopic {
            topic,
            configs: Vec::new(),
        })
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &KafkaTopicState,
    ) -> Result<RemoteTopic, ProviderError> {
        let url = topic_url(session.ctx(), local)?;
        let topic: TopicData = session.client().get(&url).await?;
        let configs: ConfigList = session.client().get(&format!("{}/configs", url)).await?;
        Ok(RemoteTopic {
            topic,
            configs: configs.data,
        })
    }

    async fn update(
        &self,
        session: &Session<'_>,
        prior: &KafkaTopicState,
        desired: &KafkaTopicState,
        changed: &[String],
    ) -> Result<(), ProviderError> {
        let url = topic_url(session.ctx(), desired)?;

        if changed.iter().any(|c| c == "partitions_count") {
            if let Some(partitions_count) = desired.partitions_count {
                let _: serde_json::Value = session
                    .client()
                    .patch(&url, &PartitionsRequest { partitions_count })
                    .await?;
            }
        }

        if changed.iter().any(|c| c == "config") {
            let data = config_changes(&prior.config, &desired.config);
            if !data.is_empty() {
                session
                    .client()
                    .post_empty(&format!("{}/configs:alter", url), &AlterRequest { data })
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete(
        &self,
        session: &Session<'_>,
        local: &KafkaTopicState,
    ) -> Result<(), ProviderError> {
        session
            .client()
            .delete(&topic_url(session.ctx(), local)?)
            .await
    }
}
