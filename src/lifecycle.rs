//! Generic lifecycle orchestration for resource kinds.
//!
//! A resource kind implements [`ResourceKind`]: its schema, typed local and
//! remote models, status classification and the raw API calls. [`Lifecycle`]
//! sequences those calls into complete transitions:
//!
//! ```text
//! create:  validate -> create call -> await {Stable, Failed} -> read
//! read:    read -> (not found on a known instance => gone)
//! update:  validate -> guard changed attributes -> update calls -> await {Stable, Failed} -> read
//! delete:  delete call -> await {Deleted}
//! import:  parse key -> read as a new instance
//! ```
//!
//! Every transition either returns the full observed state or an error naming
//! the resource type and identifier; partial state is never returned.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::client::ScopedClient;
use crate::config::{Credentials, ProviderContext};
use crate::error::ProviderError;
use crate::mapper::{self, redacted};
use crate::schema::{AttributeType, Diagnostic, Schema};
use crate::status::LifecycleState;
use crate::types::{AttributeChange, ImportKey, PlanResult};
use crate::validation;
use crate::wait::{await_state, Observation, WaitOptions};

/// A state-changing transition that waits for the remote object to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Waiting for a new object to become usable.
    Create,
    /// Waiting for a mutation to be applied.
    Update,
    /// Waiting for the object to disappear.
    Delete,
}

/// The HTTP client and context available to a kind's API calls.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    ctx: &'a ProviderContext,
    client: ScopedClient<'a>,
}

impl<'a> Session<'a> {
    /// Bind a context, credentials and cancellation token.
    pub fn new(
        ctx: &'a ProviderContext,
        credentials: Option<&Credentials>,
        cancel: &CancellationToken,
    ) -> Self {
        Self {
            ctx,
            client: ctx.client().scoped(credentials, cancel),
        }
    }

    /// The provider context.
    pub fn ctx(&self) -> &'a ProviderContext {
        self.ctx
    }

    /// The HTTP client bound to this operation.
    pub fn client(&self) -> &ScopedClient<'a> {
        &self.client
    }
}

/// One kind of managed object.
///
/// `Local` is the typed form of the persisted state, `Remote` the typed form
/// of what a read returns. The mapping between them must be pure.
#[async_trait]
pub trait ResourceKind: Send + Sync + 'static {
    /// The resource type name, e.g. `confluent_network`.
    const NAME: &'static str;

    /// Typed local state.
    type Local: Serialize + DeserializeOwned + Clone + Debug + Send + Sync;

    /// Typed remote representation.
    type Remote: Debug + Send + Sync;

    /// The resource schema.
    fn schema(&self) -> Schema;

    /// The segment names of the import key, e.g. `["environment_id", "network_id"]`.
    fn import_key(&self) -> &'static [&'static str];

    /// Attributes that may change without replacing the resource.
    fn updatable_attributes(&self) -> &'static [&'static str];

    /// The identity stored in state, empty before creation.
    fn id(&self, local: &Self::Local) -> String;

    /// Seed local state from an import key so the object can be read.
    fn from_import(&self, key: &ImportKey) -> Self::Local;

    /// Classify a remote object against the state the caller expects.
    fn classify(
        &self,
        remote: &Self::Remote,
        expected: &Self::Local,
    ) -> Result<LifecycleState, ProviderError>;

    /// Why the remote object failed, verbatim from the server when available.
    fn failure_reason(&self, _remote: &Self::Remote) -> String {
        "no reason reported by the server".to_string()
    }

    /// Timing for waits after `transition`.
    fn wait_options(&self, _transition: Transition) -> WaitOptions {
        WaitOptions::default()
    }

    /// Credentials for API calls on `local`.
    fn credentials<'a>(
        &self,
        ctx: &'a ProviderContext,
        _local: &'a Self::Local,
    ) -> Option<&'a Credentials> {
        ctx.cloud_credentials()
    }

    /// Checks on a new object beyond the schema.
    fn validate_create(&self, _desired: &Self::Local) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Checks on an in-place update beyond the allow-list.
    fn validate_update(
        &self,
        _prior: &Self::Local,
        _desired: &Self::Local,
        _changed: &[String],
    ) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Map a remote object to local state. `prior` supplies what the server does not return.
    fn to_local(&self, remote: &Self::Remote, prior: &Self::Local) -> Self::Local;

    /// Issue the create call.
    async fn create(
        &self,
        session: &Session<'_>,
        desired: &Self::Local,
    ) -> Result<Self::Remote, ProviderError>;

    /// Read the object.
    async fn read(
        &self,
        session: &Session<'_>,
        local: &Self::Local,
    ) -> Result<Self::Remote, ProviderError>;

    /// Apply the changed attributes, one call per field group.
    async fn update(
        &self,
        session: &Session<'_>,
        prior: &Self::Local,
        desired: &Self::Local,
        changed: &[String],
    ) -> Result<(), ProviderError>;

    /// Issue the delete call.
    async fn delete(&self, session: &Session<'_>, local: &Self::Local)
        -> Result<(), ProviderError>;
}

/// Runs transitions for one resource kind.
#[derive(Debug, Clone)]
pub struct Lifecycle<K> {
    kind: K,
    waits: HashMap<Transition, WaitOptions>,
}

impl<K: ResourceKind> Lifecycle<K> {
    /// Create an orchestrator with the kind's default timing.
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            waits: HashMap::new(),
        }
    }

    /// Override the timing of one transition.
    pub fn with_wait(mut self, transition: Transition, options: WaitOptions) -> Self {
        self.waits.insert(transition, options);
        self
    }

    /// Override the timing of every transition.
    pub fn with_waits(self, options: WaitOptions) -> Self {
        self.with_wait(Transition::Create, options)
            .with_wait(Transition::Update, options)
            .with_wait(Transition::Delete, options)
    }

    /// Timing used after `transition`.
    pub fn wait_options(&self, transition: Transition) -> WaitOptions {
        self.waits
            .get(&transition)
            .copied()
            .unwrap_or_else(|| self.kind.wait_options(transition))
    }

    /// Validate configuration without touching the network.
    pub fn validate_config(&self, config: &Value) -> Result<K::Local, ProviderError> {
        validation::ensure_valid(&self.kind.schema(), config)?;
        mapper::from_state(config)
    }

    /// Create the object and wait until it is usable.
    #[instrument(skip_all, name = "lifecycle.create", fields(resource_type = K::NAME))]
    pub async fn create(
        &self,
        ctx: &ProviderContext,
        config: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError> {
        let mut assigned: Option<String> = None;

        let result = async {
            let desired = self.validate_config(config)?;
            self.kind.validate_create(&desired)?;
            self.snapshot("Creating", &desired);

            let session = Session::new(ctx, self.kind.credentials(ctx, &desired), cancel);
            let created = self.kind.create(&session, &desired).await?;
            let local = self.kind.to_local(&created, &desired);
            let id = self.kind.id(&local);
            info!(resource_type = K::NAME, id = %id, "Create accepted, waiting for a stable state");
            assigned = Some(id);

            let observation = self
                .await_settled(&session, &local, Transition::Create)
                .await?;
            self.fail_if_failed(&observation)?;

            let remote = self.kind.read(&session, &local).await?;
            let observed = self.kind.to_local(&remote, &local);
            self.snapshot("Created", &observed);
            mapper::to_state(&observed)
        }
        .await;

        result.map_err(|e| e.in_resource(K::NAME, assigned.as_deref()))
    }

    /// Refresh state. Returns `None` when the object no longer exists.
    #[instrument(skip_all, name = "lifecycle.read", fields(resource_type = K::NAME))]
    pub async fn read(
        &self,
        ctx: &ProviderContext,
        state: &Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, ProviderError> {
        let local: K::Local = mapper::from_state(state).map_err(|e| e.in_resource(K::NAME, None))?;
        let id = self.kind.id(&local);
        self.refresh(ctx, &local, false, cancel)
            .await
            .map_err(|e| e.in_resource(K::NAME, Some(&id)))
    }

    /// Apply an in-place update and wait until it settles.
    #[instrument(skip_all, name = "lifecycle.update", fields(resource_type = K::NAME))]
    pub async fn update(
        &self,
        ctx: &ProviderContext,
        prior_state: &Value,
        config: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError> {
        let schema = self.kind.schema();
        let prior: K::Local =
            mapper::from_state(prior_state).map_err(|e| e.in_resource(K::NAME, None))?;
        let id = self.kind.id(&prior);

        let result = async {
            validation::ensure_valid(&schema, config)?;
            let merged = merge_computed(&schema, prior_state, config);
            let desired: K::Local = mapper::from_state(&merged)?;
            let changed = changed_attributes(&schema, prior_state, &merged);

            self.guard_update(&schema, &changed)?;
            self.kind.validate_update(&prior, &desired, &changed)?;

            let session = Session::new(ctx, self.kind.credentials(ctx, &desired), cancel);
            if changed.is_empty() {
                debug!(resource_type = K::NAME, id = %id, "Nothing to update");
            } else {
                info!(resource_type = K::NAME, id = %id, changed = ?changed, "Updating");
                self.kind.update(&session, &prior, &desired, &changed).await?;

                let observation = self
                    .await_settled(&session, &desired, Transition::Update)
                    .await?;
                self.fail_if_failed(&observation)?;
            }

            let remote = self.kind.read(&session, &desired).await?;
            let observed = self.kind.to_local(&remote, &desired);
            self.snapshot("Updated", &observed);
            mapper::to_state(&observed)
        }
        .await;

        result.map_err(|e| e.in_resource(K::NAME, Some(&id)))
    }

    /// Delete the object and wait until it is gone.
    #[instrument(skip_all, name = "lifecycle.delete", fields(resource_type = K::NAME))]
    pub async fn delete(
        &self,
        ctx: &ProviderContext,
        state: &Value,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        let local: K::Local = mapper::from_state(state).map_err(|e| e.in_resource(K::NAME, None))?;
        let id = self.kind.id(&local);

        let result = async {
            let session = Session::new(ctx, self.kind.credentials(ctx, &local), cancel);
            info!(resource_type = K::NAME, id = %id, "Deleting");
            self.kind.delete(&session, &local).await?;

            let (kind, session_ref, local_ref) = (&self.kind, &session, &local);
            await_state(
                || async move {
                    let remote = kind.read(session_ref, local_ref).await?;
                    let state = kind.classify(&remote, local_ref)?;
                    debug!(resource_type = K::NAME, state = %state, "Polled");
                    Ok(Observation::new(state, remote))
                },
                &[LifecycleState::Deleted],
                self.wait_options(Transition::Delete),
                cancel,
            )
            .await?;

            info!(resource_type = K::NAME, id = %id, "Deleted");
            Ok::<(), ProviderError>(())
        }
        .await;

        result.map_err(|e| e.in_resource(K::NAME, Some(&id)))
    }

    /// Bring an existing object under management from its import key.
    #[instrument(skip_all, name = "lifecycle.import", fields(resource_type = K::NAME))]
    pub async fn import(
        &self,
        ctx: &ProviderContext,
        import_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError> {
        let result = async {
            let key = ImportKey::parse(import_id, self.kind.import_key())?;
            let seed = self.kind.from_import(&key);
            info!(resource_type = K::NAME, import_id, "Importing");
            self.refresh(ctx, &seed, true, cancel)
                .await?
                .ok_or_else(|| ProviderError::NotFound(import_id.to_string()))
        }
        .await;

        result.map_err(|e| e.in_resource(K::NAME, Some(import_id)))
    }

    /// Read `local`. A new instance never treats a missing object as gone.
    async fn refresh(
        &self,
        ctx: &ProviderContext,
        local: &K::Local,
        is_new: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, ProviderError> {
        let session = Session::new(ctx, self.kind.credentials(ctx, local), cancel);
        let remote = match self.kind.read(&session, local).await {
            Ok(remote) => remote,
            Err(err) if err.is_not_found() && !is_new => {
                info!(
                    resource_type = K::NAME,
                    id = %self.kind.id(local),
                    "Object no longer exists, removing from state"
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let state = self.kind.classify(&remote, local)?;
        if state == LifecycleState::Deleted && !is_new {
            info!(resource_type = K::NAME, id = %self.kind.id(local), "Object is deleted, removing from state");
            return Ok(None);
        }

        let observed = self.kind.to_local(&remote, local);
        self.snapshot("Read", &observed);
        Ok(Some(mapper::to_state(&observed)?))
    }

    async fn await_settled(
        &self,
        session: &Session<'_>,
        expected: &K::Local,
        transition: Transition,
    ) -> Result<Observation<K::Remote>, ProviderError> {
        let kind = &self.kind;
        await_state(
            || async move {
                let remote = kind.read(session, expected).await?;
                let state = kind.classify(&remote, expected)?;
                debug!(resource_type = K::NAME, state = %state, "Polled");
                Ok(Observation::new(state, remote))
            },
            &[LifecycleState::Stable, LifecycleState::Failed],
            self.wait_options(transition),
            session.client().cancel_token(),
        )
        .await
    }

    fn fail_if_failed(&self, observation: &Observation<K::Remote>) -> Result<(), ProviderError> {
        match (&observation.state, &observation.remote) {
            (LifecycleState::Failed, Some(remote)) => Err(ProviderError::RemoteFailed(
                self.kind.failure_reason(remote),
            )),
            (LifecycleState::Failed, None) => Err(ProviderError::RemoteFailed(
                "no reason reported by the server".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn guard_update(&self, schema: &Schema, changed: &[String]) -> Result<(), ProviderError> {
        let allowed = self.kind.updatable_attributes();
        for name in changed {
            if schema.is_force_new(name) {
                return Err(ProviderError::Validation(format!(
                    "'{}' cannot be changed in place; changing it requires replacing the resource",
                    name
                )));
            }
            if !allowed.contains(&name.as_str()) {
                return Err(ProviderError::Validation(format!(
                    "'{}' is not updatable (updatable attributes: {}); the resource must be replaced",
                    name,
                    allowed.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn snapshot(&self, message: &str, local: &K::Local) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(value) = mapper::to_state(local) {
                let snapshot = redacted(&self.kind.schema(), &value);
                debug!(resource_type = K::NAME, state = %snapshot, "{}", message);
            }
        }
    }
}

/// Whether a value counts as unset: null, empty string, list or map.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn same(a: Option<&Value>, b: Option<&Value>) -> bool {
    (is_blank(a) && is_blank(b)) || a == b
}

/// Fill attributes the configuration leaves to the server from prior state.
///
/// Computed attributes, and optional-computed attributes left unset, keep
/// their prior values so that they do not show up as changes.
pub fn merge_computed(schema: &Schema, prior: &Value, desired: &Value) -> Value {
    let mut merged = desired.clone();
    let (Some(target), Some(source)) = (merged.as_object_mut(), prior.as_object()) else {
        return merged;
    };

    let defaulted = schema
        .block
        .attributes
        .iter()
        .filter(|(_, attr)| attr.flags.computed)
        .map(|(name, _)| name)
        .chain(
            schema
                .block
                .blocks
                .iter()
                .filter(|(_, block)| block.computed)
                .map(|(name, _)| name),
        );

    for name in defaulted {
        if is_blank(target.get(name)) {
            if let Some(value) = source.get(name) {
                target.insert(name.clone(), value.clone());
            }
        }
    }
    merged
}

/// Set elements in a canonical order.
fn unordered(value: Option<&Value>) -> Option<Value> {
    value.map(|v| match v {
        Value::Array(items) => {
            let mut items = items.clone();
            items.sort_by_key(|item| item.to_string());
            Value::Array(items)
        }
        other => other.clone(),
    })
}

/// Top-level configurable attributes whose values differ.
///
/// Null, empty strings and empty collections are equal; sets ignore order.
pub fn changed_attributes(schema: &Schema, prior: &Value, desired: &Value) -> Vec<String> {
    schema
        .configurable_names()
        .filter(|name| {
            let is_set = schema
                .block
                .attributes
                .get(*name)
                .is_some_and(|attr| matches!(attr.attr_type, AttributeType::Set(_)));
            if is_set {
                !same(
                    unordered(prior.get(*name)).as_ref(),
                    unordered(desired.get(*name)).as_ref(),
                )
            } else {
                !same(prior.get(*name), desired.get(*name))
            }
        })
        .map(str::to_string)
        .collect()
}

/// Plan a change from `prior` (or nothing) to `proposed`.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let Some(prior) = prior else {
        let changes = schema
            .configurable_names()
            .filter_map(|name| {
                proposed
                    .get(name)
                    .filter(|v| !is_blank(Some(v)))
                    .map(|v| AttributeChange::added(name, v.clone()))
            })
            .collect();
        return PlanResult::with_changes(proposed.clone(), changes);
    };

    let planned = merge_computed(schema, prior, proposed);
    let changes = changed_attributes(schema, prior, &planned)
        .into_iter()
        .map(|name| {
            let before = prior.get(&name).filter(|v| !is_blank(Some(v))).cloned();
            let after = planned.get(&name).filter(|v| !is_blank(Some(v))).cloned();
            let change = AttributeChange::new(name.as_str(), before, after);
            if schema.is_force_new(&name) {
                change.replacing()
            } else {
                change
            }
        })
        .collect();
    PlanResult::with_changes(planned, changes)
}

/// A resource kind behind a trait object, as stored in the provider registry.
#[async_trait]
pub trait DynResource: Send + Sync {
    /// The resource type name.
    fn name(&self) -> &'static str;

    /// The resource schema.
    fn schema(&self) -> Schema;

    /// Validate configuration without touching the network.
    fn validate(&self, config: &Value) -> Vec<Diagnostic>;

    /// See [`Lifecycle::create`].
    async fn create(
        &self,
        ctx: &ProviderContext,
        config: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError>;

    /// See [`Lifecycle::read`].
    async fn read(
        &self,
        ctx: &ProviderContext,
        state: &Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, ProviderError>;

    /// See [`Lifecycle::update`].
    async fn update(
        &self,
        ctx: &ProviderContext,
        prior_state: &Value,
        config: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError>;

    /// See [`Lifecycle::delete`].
    async fn delete(
        &self,
        ctx: &ProviderContext,
        state: &Value,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError>;

    /// See [`Lifecycle::import`].
    async fn import(
        &self,
        ctx: &ProviderContext,
        import_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<K: ResourceKind> DynResource for Lifecycle<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn schema(&self) -> Schema {
        self.kind.schema()
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let diagnostics = validation::validate(&self.kind.schema(), config);
        if !diagnostics.is_empty() {
            return diagnostics;
        }
        match mapper::from_state::<K::Local>(config)
            .and_then(|desired| self.kind.validate_create(&desired))
        {
            Ok(()) => Vec::new(),
            Err(err) => vec![err.to_diagnostic()],
        }
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        config: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError> {
        Lifecycle::create(self, ctx, config, cancel).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        state: &Value,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, ProviderError> {
        Lifecycle::read(self, ctx, state, cancel).await
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        prior_state: &Value,
        config: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError> {
        Lifecycle::update(self, ctx, prior_state, config, cancel).await
    }

    async fn delete(
        &self,
        ctx: &ProviderContext,
        state: &Value,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        Lifecycle::delete(self, ctx, state, cancel).await
    }

    async fn import(
        &self,
        ctx: &ProviderContext,
        import_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, ProviderError> {
        Lifecycle::import(self, ctx, import_id, cancel).await
    }
}
