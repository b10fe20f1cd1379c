//! Provider configuration and the immutable context shared by all operations.
//!
//! The provider block is deserialized into [`ProviderConfig`], missing values
//! are filled in from environment variables, and the result is frozen into a
//! [`ProviderContext`] that every lifecycle call receives by reference.
//!
//! # Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `CONFLUENT_CLOUD_API_KEY` | `cloud_api_key` |
//! | `CONFLUENT_CLOUD_API_SECRET` | `cloud_api_secret` |
//! | `CONFLUENT_CLOUD_ENDPOINT` | `endpoint` |
//! | `KAFKA_ID` | `kafka_id` |
//! | `KAFKA_REST_ENDPOINT` | `kafka_rest_endpoint` |
//! | `KAFKA_API_KEY` | `kafka_api_key` |
//! | `KAFKA_API_SECRET` | `kafka_api_secret` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, RetryConfig};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Default Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.confluent.cloud";

/// Default number of transport-level retries.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// An API key/secret pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The API key.
    pub key: String,
    /// The API secret.
    pub secret: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Pick the resource-scoped credentials when present, else the ambient ones.
    pub fn resolve<'a>(
        scoped: Option<&'a Credentials>,
        ambient: Option<&'a Credentials>,
    ) -> Option<&'a Credentials> {
        scoped.or(ambient)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}

/// Provider configuration as supplied in the provider block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Cloud API key.
    pub cloud_api_key: Option<String>,
    /// Cloud API secret.
    pub cloud_api_secret: Option<String>,
    /// Cloud API base endpoint.
    pub endpoint: Option<String>,
    /// Transport-level retry budget for transient failures.
    pub max_retries: Option<u32>,
    /// Ambient Kafka cluster ID for topic resources.
    pub kafka_id: Option<String>,
    /// Ambient Kafka REST endpoint.
    pub kafka_rest_endpoint: Option<String>,
    /// Ambient Kafka API key.
    pub kafka_api_key: Option<String>,
    /// Ambient Kafka API secret.
    pub kafka_api_secret: Option<String>,
    /// Appended to the User-Agent header.
    pub user_agent_suffix: Option<String>,
}

impl ProviderConfig {
    /// Parse the provider block.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| ProviderError::Configuration(format!("invalid provider block: {}", e)))
    }

    /// Fill unset fields from the process environment.
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|name| std::env::var(name).ok())
    }

    /// Fill unset fields from a lookup function.
    pub fn with_fallback(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fill = |field: &mut Option<String>, var: &str| {
            if field.is_none() {
                *field = lookup(var).filter(|v| !v.is_empty());
            }
        };
        fill(&mut self.cloud_api_key, "CONFLUENT_CLOUD_API_KEY");
        fill(&mut self.cloud_api_secret, "CONFLUENT_CLOUD_API_SECRET");
        fill(&mut self.endpoint, "CONFLUENT_CLOUD_ENDPOINT");
        fill(&mut self.kafka_id, "KAFKA_ID");
        fill(&mut self.kafka_rest_endpoint, "KAFKA_REST_ENDPOINT");
        fill(&mut self.kafka_api_key, "KAFKA_API_KEY");
        fill(&mut self.kafka_api_secret, "KAFKA_API_SECRET");
        self
    }

    /// Check the configuration for contradictions.
    pub fn validate(&self) -> Result<(), ProviderError> {
        pair(
            &self.cloud_api_key,
            &self.cloud_api_secret,
            "cloud_api_key",
            "cloud_api_secret",
        )?;
        pair(
            &self.kafka_api_key,
            &self.kafka_api_secret,
            "kafka_api_key",
            "kafka_api_secret",
        )?;
        for (name, url) in [
            ("endpoint", &self.endpoint),
            ("kafka_rest_endpoint", &self.kafka_rest_endpoint),
        ] {
            if let Some(url) = url {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ProviderError::Configuration(format!(
                        "'{}' must be an http(s) URL, got '{}'",
                        name, url
                    )));
                }
            }
        }
        Ok(())
    }

    /// The provider block schema.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "cloud_api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Cloud API key"),
            )
            .with_attribute(
                "cloud_api_secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Cloud API secret"),
            )
            .with_attribute(
                "endpoint",
                Attribute::optional_string().with_description("Cloud API base URL"),
            )
            .with_attribute(
                "max_retries",
                Attribute::optional_int64()
                    .with_description("Retries for transient HTTP failures"),
            )
            .with_attribute("kafka_id", Attribute::optional_string())
            .with_attribute("kafka_rest_endpoint", Attribute::optional_string())
            .with_attribute("kafka_api_key", Attribute::optional_string().sensitive())
            .with_attribute("kafka_api_secret", Attribute::optional_string().sensitive())
            .with_attribute("user_agent_suffix", Attribute::optional_string())
    }
}

fn pair(
    key: &Option<String>,
    secret: &Option<String>,
    key_name: &str,
    secret_name: &str,
) -> Result<(), ProviderError> {
    match (key, secret) {
        (Some(_), None) | (None, Some(_)) => Err(ProviderError::Configuration(format!(
            "'{}' and '{}' must be set together",
            key_name, secret_name
        ))),
        _ => Ok(()),
    }
}

/// Ambient Kafka cluster scope used by cluster-level resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KafkaScope {
    /// Cluster ID.
    pub cluster_id: Option<String>,
    /// Cluster REST endpoint.
    pub rest_endpoint: Option<String>,
    /// Cluster API credentials.
    pub credentials: Option<Credentials>,
}

/// Immutable, process-wide context handed to every operation.
///
/// Built once by [`ProviderContext::new`]; nothing in it changes afterwards,
/// so it is shared across concurrently running operations without locking.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    client: ApiClient,
    cloud_credentials: Option<Credentials>,
    kafka: KafkaScope,
}

impl ProviderContext {
    /// Build a context from a validated configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;

        let retry = RetryConfig::new(config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES));
        let endpoint = config
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let client = ApiClient::new(&endpoint, retry, config.user_agent_suffix.as_deref())?;

        let cloud_credentials = match (config.cloud_api_key, config.cloud_api_secret) {
            (Some(key), Some(secret)) => Some(Credentials::new(key, secret)),
            _ => None,
        };
        let kafka_credentials = match (config.kafka_api_key, config.kafka_api_secret) {
            (Some(key), Some(secret)) => Some(Credentials::new(key, secret)),
            _ => None,
        };

        Ok(Self {
            client,
            cloud_credentials,
            kafka: KafkaScope {
                cluster_id: config.kafka_id,
                rest_endpoint: config.kafka_rest_endpoint,
                credentials: kafka_credentials,
            },
        })
    }

    /// The HTTP client.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Ambient Cloud API credentials.
    pub fn cloud_credentials(&self) -> Option<&Credentials> {
        self.cloud_credentials.as_ref()
    }

    /// Ambient Kafka cluster scope.
    pub fn kafka(&self) -> &KafkaScope {
        &self.kafka
    }
}
