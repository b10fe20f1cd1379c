//! `confluent_environment`: a container for clusters, networks and pools.
//!
//! Environments are created synchronously, so every successful read is stable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session};
use crate::mapper::{null_as_empty, single, wrap};
use crate::schema::{Attribute, Block, NestedBlock, Schema};
use crate::status::{AlwaysStable, LifecycleState, StatusClassifier};
use crate::types::ImportKey;

use super::{child_path, one_of, Metadata};

const PATH: &str = "/org/v2/environments";
const PACKAGES: &[&str] = &["ESSENTIALS", "ADVANCED"];

/// The environment resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct Environment;

/// Persisted state of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// Environment ID, e.g. `env-abc123`.
    #[serde(default)]
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Stream Governance package, at most one block.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stream_governance: Vec<StreamGovernance>,
    /// Confluent Resource Name.
    #[serde(default)]
    pub resource_name: String,
}

/// The `stream_governance` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamGovernance {
    /// `ESSENTIALS` or `ADVANCED`.
    pub package: String,
}

/// An environment as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEnvironment {
    id: String,
    display_name: String,
    #[serde(default)]
    stream_governance_config: Option<StreamGovernance>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Serialize)]
struct EnvironmentRequest<'a> {
    display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_governance_config: Option<&'a StreamGovernance>,
}

impl<'a> From<&'a EnvironmentState> for EnvironmentRequest<'a> {
    fn from(local: &'a EnvironmentState) -> Self {
        Self {
            display_name: &local.display_name,
            stream_governance_config: single(&local.stream_governance),
        }
    }
}

fn package_rank(package: &str) -> usize {
    PACKAGES.iter().position(|p| *p == package).unwrap_or(0)
}

impl Environment {
    /// Schema of the `confluent_environment` data source.
    pub fn data_source_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::required_string())
            .with_attribute("display_name", Attribute::computed_string())
            .with_attribute("resource_name", Attribute::computed_string())
            .with_block(
                "stream_governance",
                NestedBlock::single(
                    Block::new().with_attribute("package", Attribute::computed_string()),
                )
                .computed(),
            )
    }
}

#[async_trait]
impl ResourceKind for Environment {
    const NAME: &'static str = "confluent_environment";
    type Local = EnvironmentState;
    type Remote = RemoteEnvironment;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "display_name",
                Attribute::required_string().with_description("Human-readable environment name"),
            )
            .with_attribute("resource_name", Attribute::computed_string())
            .with_block(
                "stream_governance",
                NestedBlock::single(
                    Block::new().with_attribute("package", Attribute::required_string()),
                )
                .computed(),
            )
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["environment_id"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["display_name", "stream_governance"]
    }

    fn id(&self, local: &EnvironmentState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> EnvironmentState {
        EnvironmentState {
            id: key.leaf().to_string(),
            display_name: String::new(),
            stream_governance: Vec::new(),
            resource_name: String::new(),
        }
    }

    fn classify(
        &self,
        _remote: &RemoteEnvironment,
        _expected: &EnvironmentState,
    ) -> Result<LifecycleState, ProviderError> {
        AlwaysStable.classify("")
    }

    fn validate_create(&self, desired: &EnvironmentState) -> Result<(), ProviderError> {
        if let Some(governance) = single(&desired.stream_governance) {
            one_of("stream_governance.0.package", &governance.package, PACKAGES)?;
        }
        Ok(())
    }

    fn validate_update(
        &self,
        prior: &EnvironmentState,
        desired: &EnvironmentState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        self.validate_create(desired)?;
        if let (Some(before), Some(after)) = (
            single(&prior.stream_governance),
            single(&desired.stream_governance),
        ) {
            if package_rank(&after.package) < package_rank(&before.package) {
                return Err(ProviderError::Validation(format!(
                    "Stream Governance package cannot be downgraded from {} to {}",
                    before.package, after.package
                )));
            }
        }
        Ok(())
    }

    fn to_local(&self, remote: &RemoteEnvironment, _prior: &EnvironmentState) -> EnvironmentState {
        EnvironmentState {
            id: remote.id.clone(),
            display_name: remote.display_name.clone(),
            stream_governance: wrap(remote.stream_governance_config.clone()),
            resource_name: remote.metadata.resource_name.clone(),
        }
    }

    async fn create(
        &self,
        session: &Session<'_>,
        desired: &EnvironmentState,
    ) -> Result<RemoteEnvironment, ProviderError> {
        session
            .client()
            .post(PATH, &EnvironmentRequest::from(desired))
            .await
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &EnvironmentState,
    ) -> Result<RemoteEnvironment, ProviderError> {
        session
            .client()
            .get(&child_path(PATH, &local.id))
            .await
    }

    async fn update(
        &self,
        session: &Session<'_>,
        _prior: &EnvironmentState,
        desired: &EnvironmentState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        let _: serde_json::Value = session
            .client()
            .patch(
                &child_path(PATH, &desired.id),
                &EnvironmentRequest::from(desired),
            )
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        session: &Session<'_>,
        local: &EnvironmentState,
    ) -> Result<(), ProviderError> {
        session
            .client()
            .delete(&child_path(PATH, &local.id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn state(package: Option<&str>) -> EnvironmentState {
        EnvironmentState {
            id: "env-1".to_string(),
            display_name: "staging".to_string(),
            stream_governance: wrap(package.map(|p| StreamGovernance {
                package: p.to_string(),
            })),
            resource_name: String::new(),
        }
    }

    #[test]
    fn test_request_omits_unset_governance() {
        let body = serde_json::to_value(EnvironmentRequest::from(&state(None))).unwrap();
        assert_eq!(body, json!({"display_name": "staging"}));

        let body = serde_json::to_value(EnvironmentRequest::from(&state(Some("ESSENTIALS")))).unwrap();
        assert_eq!(body["stream_governance_config"]["package"], "ESSENTIALS");
    }

    #[test]
    fn test_to_local_maps_governance_to_block() {
        let remote: RemoteEnvironment = serde_json::from_value(json!({
            "id": "env-1",
            "display_name": "staging",
            "stream_governance_config": {"package": "ADVANCED"},
            "metadata": {"resource_name": "crn://confluent.cloud/organization=o/environment=env-1"}
        }))
        .unwrap();
        let local = Environment.to_local(&remote, &state(None));
        assert_eq!(local.stream_governance, vec![StreamGovernance { package: "ADVANCED".to_string() }]);
        assert!(local.resource_name.ends_with("environment=env-1"));

        let remote: RemoteEnvironment =
            serde_json::from_value(json!({"id": "env-1", "display_name": "staging"})).unwrap();
        let local = Environment.to_local(&remote, &state(None));
        assert!(local.stream_governance.is_empty());
    }

    #[test]
    fn test_state_deserializes_null_block_as_empty() {
        let local: EnvironmentState =
            serde_json::from_value(json!({"display_name": "x", "stream_governance": null})).unwrap();
        assert!(local.stream_governance.is_empty());
        assert!(local.id.is_empty());
    }

    #[test]
    fn test_package_validation() {
        assert!(Environment.validate_create(&state(Some("ADVANCED"))).is_ok());
        let err = Environment.validate_create(&state(Some("PREMIUM"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(Environment
            .validate_update(&state(Some("ESSENTIALS")), &state(Some("ADVANCED")), &[])
            .is_ok());
        let err = Environment
            .validate_update(&state(Some("ADVANCED")), &state(Some("ESSENTIALS")), &[])
            .unwrap_err();
        assert!(err.to_string().contains("cannot be downgraded"));
    }
}
