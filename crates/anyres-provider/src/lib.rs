//! # anyres-provider
//!
//! Lifecycle engine of the generic resource: one resource type that can
//! manage any server-side object given its type string, parent and JSON body.
//!
//! The phases, in the order a host drives them:
//!
//! 1. [`GenericResource::validate_config`]: static checks, returned as [`Diagnostics`]
//! 2. [`GenericResource::plan`]: the proposed next state and the attributes forcing replacement
//! 3. [`GenericResource::create`] / [`GenericResource::update`]: apply the plan
//! 4. [`GenericResource::read`]: refresh state from the server
//! 5. [`GenericResource::delete`] and [`GenericResource::import_state`]
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use anyres_client::InMemoryResourceClient;
//! use anyres_config::ProviderConfig;
//! use anyres_provider::{Provider, ResourceModel};
//!
//! # async fn run() -> anyres_provider::Result<()> {
//! let provider = Provider::configure(
//!     ProviderConfig::new("00000000-0000-0000-0000-000000000000"),
//!     Arc::new(InMemoryResourceClient::new()),
//! )?;
//! let resource = provider.resource();
//!
//! let mut config = ResourceModel::new("Microsoft.Resources/resourceGroups@2021-04-01")
//!     .with_name("example")
//!     .with_location("westeurope");
//! // no definitions are registered, so skip the structural check
//! config.schema_validation_enabled = false;
//! let plan = resource.plan(&config, None)?;
//! let state = resource.create(&plan.planned_state).await?;
//! # let _ = state;
//! # Ok(())
//! # }
//! ```

pub mod attr;
mod body;
pub mod diagnostics;
pub mod error;
pub mod locks;
pub mod model;
pub mod observability;
pub mod output;
pub mod plan;
pub mod provider;
pub mod resource;
mod validate;

pub use attr::Attr;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ErrorCategory, Operation, ProviderError, Result};
pub use locks::{LockSet, LockTable};
pub use model::{ResourceModel, Timeouts};
pub use output::{EXPORT_ALL, flatten_output, flatten_output_payload};
pub use plan::PlanResponse;
pub use provider::{Provider, ProviderData};
pub use resource::{GenericResource, RESOURCE_TYPE_NAME};
