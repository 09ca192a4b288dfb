//! In-memory schema registry.
//!
//! Definitions are indexed by lower-cased resource type, then by api version.
//! Uses DashMap so definitions can be registered while lookups are served.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyres_core::{ResourceDefinition, SchemaRegistry};
use dashmap::DashMap;

use crate::error::{ClientError, Result};

/// [`SchemaRegistry`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySchemaRegistry {
    /// lower-cased resource type -> api version -> definition
    by_type: DashMap<String, BTreeMap<String, Arc<ResourceDefinition>>>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition, replacing any previous one for the same
    /// resource type and api version.
    pub fn register(&self, definition: ResourceDefinition) {
        let key = definition.resource_type.to_lowercase();
        let definition = Arc::new(definition);
        self.by_type
            .entry(key)
            .or_default()
            .insert(definition.api_version.clone(), definition);
    }

    /// Builds a registry from a JSON array of definitions.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let definitions: Vec<ResourceDefinition> = serde_json::from_str(input)
            .map_err(|e| ClientError::definitions(e.to_string()))?;
        let registry = Self::new();
        for definition in definitions {
            registry.register(definition);
        }
        tracing::debug!(
            resource_types = registry.by_type.len(),
            "loaded resource definitions"
        );
        Ok(registry)
    }

    /// Builds a registry from a file holding a JSON array of definitions.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::definitions(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Number of registered `(resource type, api version)` pairs.
    pub fn len(&self) -> usize {
        self.by_type.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn resource_definition(
        &self,
        resource_type: &str,
        api_version: &str,
    ) -> Option<Arc<ResourceDefinition>> {
        let versions = self.by_type.get(&resource_type.to_lowercase())?;
        versions
            .iter()
            .find(|(version, _)| version.eq_ignore_ascii_case(api_version))
            .map(|(_, def)| def.clone())
    }

    fn api_versions(&self, resource_type: &str) -> Vec<String> {
        self.by_type
            .get(&resource_type.to_lowercase())
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyres_core::{PropertyDefinition, TypeDefinition};

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = InMemorySchemaRegistry::new();
        registry.register(ResourceDefinition::new(
            "Microsoft.Network/virtualNetworks",
            "2023-04-01",
        ));
        assert!(
            registry
                .resource_definition("microsoft.network/VIRTUALNETWORKS", "2023-04-01")
                .is_some()
        );
        assert!(
            registry
                .resource_definition("Microsoft.Network/virtualNetworks", "2020-01-01")
                .is_none()
        );
    }

    #[test]
    fn test_api_versions_oldest_first() {
        let registry = InMemorySchemaRegistry::new();
        for version in ["2023-04-01", "2021-02-01", "2022-07-01"] {
            registry.register(ResourceDefinition::new("Microsoft.Foo/bars", version));
        }
        assert_eq!(
            registry.api_versions("Microsoft.Foo/bars"),
            vec!["2021-02-01", "2022-07-01", "2023-04-01"]
        );
        assert_eq!(
            registry.latest_api_version("microsoft.foo/bars").as_deref(),
            Some("2023-04-01")
        );
        assert!(registry.api_versions("Microsoft.Foo/unknown").is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_from_json_str() {
        let registry = InMemorySchemaRegistry::from_json_str(
            r#"[{
                "resourceType": "Microsoft.Resources/resourceGroups",
                "apiVersion": "2021-04-01",
                "body": {"properties": {"location": {"type": "string", "required": true}}}
            }]"#,
        )
        .unwrap();
        let def = registry
            .resource_definition("Microsoft.Resources/resourceGroups", "2021-04-01")
            .unwrap();
        assert_eq!(
            def.body.properties.get("location"),
            Some(&PropertyDefinition::new(TypeDefinition::String { allowed_values: Vec::new() }).required())
        );

        let err = InMemorySchemaRegistry::from_json_str("{").unwrap_err();
        assert!(matches!(err, ClientError::Definitions { .. }));
    }
}
