//! Provider setup: configuration, shared collaborators and the resource handle.

use std::sync::Arc;

use anyres_client::{InMemorySchemaRegistry, ResourceClient};
use anyres_config::{FeaturesConfig, ProviderConfig, TimeoutsConfig};
use anyres_core::SchemaRegistry;

use crate::error::{ProviderError, Result};
use crate::locks::LockTable;
use crate::observability;
use crate::resource::GenericResource;

/// Collaborators and settings shared by every resource instance.
///
/// The client and registry are read-only shared references; the lock table
/// is the only shared mutable state.
pub struct ProviderData {
    pub subscription_id: String,
    pub features: FeaturesConfig,
    pub timeouts: TimeoutsConfig,
    pub client: Arc<dyn ResourceClient>,
    pub registry: Arc<dyn SchemaRegistry>,
    pub locks: LockTable,
}

impl std::fmt::Debug for ProviderData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderData")
            .field("subscription_id", &self.subscription_id)
            .field("features", &self.features)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Provider {
    data: Arc<ProviderData>,
}

impl Provider {
    /// Validates `config`, applies its logging level and loads the schema
    /// registry from `schema.definitions_path` (empty when unset).
    pub fn configure(config: ProviderConfig, client: Arc<dyn ResourceClient>) -> Result<Self> {
        config.validate()?;
        let registry: Arc<dyn SchemaRegistry> = match &config.schema.definitions_path {
            Some(path) => Arc::new(
                InMemorySchemaRegistry::from_json_file(path).map_err(ProviderError::Registry)?,
            ),
            None => Arc::new(InMemorySchemaRegistry::new()),
        };
        Self::configure_with_registry(config, client, registry)
    }

    /// Like [`Provider::configure`], with a caller-supplied schema registry.
    pub fn configure_with_registry(
        config: ProviderConfig,
        client: Arc<dyn ResourceClient>,
        registry: Arc<dyn SchemaRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        observability::init_tracing_with_level(&config.logging.level);
        tracing::info!(
            subscription_id = %config.subscription_id,
            default_location = ?config.features.default_location,
            "provider configured"
        );
        Ok(Self {
            data: Arc::new(ProviderData {
                subscription_id: config.subscription_id,
                features: config.features,
                timeouts: config.timeouts,
                client,
                registry,
                locks: LockTable::new(),
            }),
        })
    }

    pub fn data(&self) -> &ProviderData {
        &self.data
    }

    /// Handle to the generic resource type backed by this provider.
    pub fn resource(&self) -> GenericResource {
        GenericResource::new(self.data.clone())
    }
}
