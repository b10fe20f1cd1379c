//! `confluent_service_account`: an identity for applications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::lifecycle::{ResourceKind, Session};
use crate::schema::{Attribute, Schema};
use crate::status::{AlwaysStable, LifecycleState, StatusClassifier};
use crate::types::ImportKey;

use super::child_path;

const PATH: &str = "/iam/v2/service-accounts";

/// The service account resource kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceAccount;

/// Persisted state of a service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountState {
    /// Service account ID, e.g. `sa-abc123`.
    #[serde(default)]
    pub id: String,
    /// Unique name. Cannot be changed.
    pub display_name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// A service account as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteServiceAccount {
    id: String,
    display_name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    display_name: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    description: &'a str,
}

#[async_trait]
impl ResourceKind for ServiceAccount {
    const NAME: &'static str = "confluent_service_account";
    type Local = ServiceAccountState;
    type Remote = RemoteServiceAccount;

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("display_name", Attribute::required_string().with_force_new())
            .with_attribute("description", Attribute::optional_string())
    }

    fn import_key(&self) -> &'static [&'static str] {
        &["service_account_id"]
    }

    fn updatable_attributes(&self) -> &'static [&'static str] {
        &["description"]
    }

    fn id(&self, local: &ServiceAccountState) -> String {
        local.id.clone()
    }

    fn from_import(&self, key: &ImportKey) -> ServiceAccountState {
        ServiceAccountState {
            id: key.leaf().to_string(),
            display_name: String::new(),
            description: String::new(),
        }
    }

    fn classify(
        &self,
        _remote: &RemoteServiceAccount,
        _expected: &ServiceAccountState,
    ) -> Result<LifecycleState, ProviderError> {
        AlwaysStable.classify("")
    }

    fn validate_create(&self, desired: &ServiceAccountState) -> Result<(), ProviderError> {
        if desired.display_name.trim().is_empty() {
            return Err(ProviderError::Validation(
                "'display_name' must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn to_local(
        &self,
        remote: &RemoteServiceAccount,
        _prior: &ServiceAccountState,
    ) -> ServiceAccountState {
        ServiceAccountState {
            id: remote.id.clone(),
            display_name: remote.display_name.clone(),
            description: remote.description.clone(),
        }
    }

    async fn create(
        &self,
        session: &Session<'_>,
        desired: &ServiceAccountState,
    ) -> Result<RemoteServiceAccount, ProviderError> {
        let request = CreateRequest {
            display_name: &desired.display_name,
            description: &desired.description,
        };
        session.client().post(PATH, &request).await
    }

    async fn read(
        &self,
        session: &Session<'_>,
        local: &ServiceAccountState,
    ) -> Result<RemoteServiceAccount, ProviderError> {
        session
            .client()
            .get(&child_path(PATH, &local.id))
            .await
    }

    async fn update(
        &self,
        session: &Session<'_>,
        _prior: &ServiceAccountState,
        desired: &ServiceAccountState,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        let request = UpdateRequest {
            description: &desired.description,
        };
        let _: serde_json::Value = session
            .client()
            .patch(&child_path(PATH, &desired.id), &request)
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        session: &Session<'_>,
        local: &ServiceAccountState,
    ) -> Result<(), ProviderError> {
        session
            .client()
            .delete(&child_path(PATH, &local.id))
            .await
    }
}
