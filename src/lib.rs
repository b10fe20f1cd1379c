//! Confluent Provider
//!
//! A declarative-infrastructure provider for a managed streaming platform:
//! environments, service accounts, networks, Kafka clusters and topics,
//! connectors and Flink compute pools.
//!
//! # Overview
//!
//! The platform provisions most objects asynchronously. A create call returns
//! at once while the object is still `PROVISIONING`, and may only become usable
//! tens of minutes later, or end up `FAILED`. The provider hides this behind
//! complete transitions:
//!
//! - **Lifecycle**: [`lifecycle::Lifecycle`] sequences validation, the API
//!   call, a poll until the object settles, and a final read.
//! - **Waiting**: [`wait::await_state`] polls at a fixed interval until a
//!   target state, a timeout or cancellation.
//! - **Status classification**: each kind maps its raw status strings to a
//!   [`LifecycleState`] through a [`status::PhaseTable`].
//! - **Mapping**: typed local and remote models per kind, converted by pure
//!   functions, with sensitive values masked in logs.
//! - **HTTP**: [`client::ApiClient`] with Basic auth, transport retries and
//!   cancellation.
//! - **Provider surface**: [`ProviderService`], implemented by
//!   [`ConfluentProvider`].
//!
//! # Quick Start
//!
//! ```no_run
//! use confluent_provider::{ConfluentProvider, ProviderService};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), confluent_provider::ProviderError> {
//! let provider = ConfluentProvider::new();
//! provider
//!     .configure(json!({"cloud_api_key": "KEY", "cloud_api_secret": "SECRET"}))
//!     .await?;
//!
//! let state = provider
//!     .create(
//!         "confluent_network",
//!         json!({
//!             "display_name": "private",
//!             "cloud": "AWS",
//!             "region": "us-east-2",
//!             "connection_types": ["PRIVATELINK"],
//!             "environment": [{"id": "env-123"}]
//!         }),
//!     )
//!     .await?;
//! println!("created {}", state["id"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Import identifiers
//!
//! Objects nested in a parent are imported by a composite identifier joined
//! with `/`, e.g. `env-123/n-456` for a network. See [`types::ImportKey`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod mapper;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod status;
pub mod testing;
pub mod types;
pub mod validation;
pub mod wait;

// Re-export main types at crate root
pub use config::{Credentials, ProviderConfig, ProviderContext};
pub use error::{ErrorKind, ProviderError};
pub use lifecycle::{DynResource, Lifecycle, ResourceKind, Transition};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{ConfluentProvider, ProviderService};
pub use schema::ProviderSchema;
pub use status::LifecycleState;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};
pub use wait::WaitOptions;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
