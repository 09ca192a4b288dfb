//! Canonical resource identifiers.
//!
//! A resource is addressed by its ARM-style id (`/subscriptions/{s}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`)
//! together with an api version. The type string users configure is
//! `<namespace>/<type>[/<child type>...]@<api version>`.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::definition::{ResourceDefinition, SchemaRegistry};
use crate::error::{CoreError, Result};

pub const RESOURCE_GROUP_TYPE: &str = "Microsoft.Resources/resourceGroups";
pub const SUBSCRIPTION_TYPE: &str = "Microsoft.Resources/subscriptions";
pub const TENANT_TYPE: &str = "Microsoft.Resources/tenants";
pub const PROVIDER_TYPE: &str = "Microsoft.Resources/providers";

static TYPE_STRING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.\-]*(/[A-Za-z0-9\-_.]+)+@[A-Za-z0-9][A-Za-z0-9\-.]*$")
        .expect("valid type string pattern")
});

/// Splits `<resource type>@<api version>`.
pub fn parse_type_string(input: &str) -> Result<(String, String)> {
    if !TYPE_STRING_PATTERN.is_match(input) {
        return Err(CoreError::invalid_resource_type(format!(
            "{input:?} is not in the format <resource type>@<api version>, e.g. \"Microsoft.Resources/resourceGroups@2020-06-01\""
        )));
    }
    let (resource_type, api_version) = input
        .split_once('@')
        .ok_or_else(|| CoreError::invalid_resource_type(input))?;
    Ok((resource_type.to_string(), api_version.to_string()))
}

pub fn is_resource_group_type(resource_type: &str) -> bool {
    resource_type.eq_ignore_ascii_case(RESOURCE_GROUP_TYPE)
}

/// Splits an id into its `/`-separated parts, rejecting malformed input.
fn id_parts(id: &str) -> Result<Vec<&str>> {
    let trimmed = id.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let rest = trimmed
        .strip_prefix('/')
        .ok_or_else(|| CoreError::invalid_resource_id(id, "a resource ID must start with \"/\""))?;
    let parts: Vec<&str> = rest.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CoreError::invalid_resource_id(id, "empty segment"));
    }
    Ok(parts)
}

fn last_providers_index(parts: &[&str]) -> Option<usize> {
    parts
        .iter()
        .rposition(|p| p.eq_ignore_ascii_case("providers"))
        .filter(|&i| i + 1 < parts.len())
}

/// Derives the resource type an id points at.
pub fn resource_type_of(id: &str) -> Result<String> {
    let parts = id_parts(id)?;
    if parts.is_empty() {
        return Ok(TENANT_TYPE.to_string());
    }

    if let Some(i) = last_providers_index(&parts) {
        let namespace = parts[i + 1];
        let rest = &parts[i + 2..];
        if rest.is_empty() {
            return Ok(PROVIDER_TYPE.to_string());
        }
        if rest.len() % 2 != 0 {
            return Err(CoreError::invalid_resource_id(
                id,
                "expected type/name pairs after the resource provider namespace",
            ));
        }
        let mut resource_type = namespace.to_string();
        for pair in rest.chunks(2) {
            resource_type.push('/');
            resource_type.push_str(pair[0]);
        }
        return Ok(resource_type);
    }

    match parts.as_slice() {
        [subscriptions, _] if subscriptions.eq_ignore_ascii_case("subscriptions") => {
            Ok(SUBSCRIPTION_TYPE.to_string())
        }
        [subscriptions, _, groups, _]
            if subscriptions.eq_ignore_ascii_case("subscriptions")
                && groups.eq_ignore_ascii_case("resourceGroups") =>
        {
            Ok(RESOURCE_GROUP_TYPE.to_string())
        }
        _ => Err(CoreError::invalid_resource_id(id, "unrecognised resource ID scope")),
    }
}

/// Splits an id into `(parent id, name)`.
fn split_parent(id: &str) -> Result<(String, String)> {
    let parts = id_parts(id)?;
    let Some(name) = parts.last() else {
        return Err(CoreError::invalid_resource_id(id, "the tenant scope has no name"));
    };

    let parent_len = match last_providers_index(&parts) {
        Some(i) => {
            let pairs = (parts.len() - i - 2) / 2;
            if pairs > 1 { parts.len() - 2 } else { i }
        }
        None => parts.len() - 2,
    };
    let parent = format!("/{}", parts[..parent_len].join("/"));
    Ok((parent, name.to_string()))
}

/// Splits `id?api-version=...` into the id and the api version, if any.
pub fn split_api_version(input: &str) -> (String, Option<String>) {
    match input.split_once('?') {
        Some((path, query)) => {
            let api_version = url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "api-version")
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty());
            (path.to_string(), api_version)
        }
        None => (input.to_string(), None),
    }
}

/// Canonical handle for one server-side object.
#[derive(Debug, Clone)]
pub struct ResourceId {
    pub name: String,
    pub parent_id: String,
    pub azure_resource_type: String,
    pub api_version: String,
    pub azure_resource_id: String,
    pub resource_def: Option<Arc<ResourceDefinition>>,
}

impl ResourceId {
    /// Builds the id of a resource named `name` of type `type_string` below `parent_id`.
    pub fn new(
        name: &str,
        parent_id: &str,
        type_string: &str,
        registry: &dyn SchemaRegistry,
    ) -> Result<Self> {
        let (resource_type, api_version) = parse_type_string(type_string)?;
        if name.is_empty() || name.contains('/') {
            return Err(CoreError::invalid_resource_id(
                name,
                "a resource name must be non-empty and must not contain \"/\"",
            ));
        }

        let parent = parent_id.trim_end_matches('/');
        let parent_type = resource_type_of(parent)?;
        let type_parts: Vec<&str> = resource_type.split('/').collect();
        let (namespace, types) = type_parts
            .split_first()
            .ok_or_else(|| CoreError::invalid_resource_type(type_string))?;

        let azure_resource_id = if is_resource_group_type(&resource_type) {
            if !parent_type.eq_ignore_ascii_case(SUBSCRIPTION_TYPE) {
                return Err(CoreError::invalid_resource_id(
                    parent_id,
                    format!("the parent of a resource group must be a subscription, got {parent_type}"),
                ));
            }
            format!("{parent}/resourceGroups/{name}")
        } else if resource_type.eq_ignore_ascii_case(SUBSCRIPTION_TYPE) {
            if !parent_type.eq_ignore_ascii_case(TENANT_TYPE) {
                return Err(CoreError::invalid_resource_id(
                    parent_id,
                    "the parent of a subscription must be the tenant scope \"/\"",
                ));
            }
            format!("/subscriptions/{name}")
        } else if types.len() > 1 {
            let expected_parent = format!("{namespace}/{}", types[..types.len() - 1].join("/"));
            if !parent_type.eq_ignore_ascii_case(&expected_parent) {
                return Err(CoreError::invalid_resource_id(
                    parent_id,
                    format!(
                        "the parent of {resource_type} must be of type {expected_parent}, got {parent_type}"
                    ),
                ));
            }
            format!("{parent}/{}/{name}", types[types.len() - 1])
        } else {
            format!("{parent}/providers/{namespace}/{}/{name}", types[0])
        };

        let resource_def = registry.resource_definition(&resource_type, &api_version);
        Ok(Self {
            name: name.to_string(),
            parent_id: if parent.is_empty() { "/".to_string() } else { parent.to_string() },
            azure_resource_type: resource_type,
            api_version,
            azure_resource_id,
            resource_def,
        })
    }

    /// Parses a persisted id, taking type and api version from `type_string`.
    pub fn with_resource_type(
        id: &str,
        type_string: &str,
        registry: &dyn SchemaRegistry,
    ) -> Result<Self> {
        let (resource_type, api_version) = parse_type_string(type_string)?;
        let actual = resource_type_of(id)?;
        if !actual.eq_ignore_ascii_case(&resource_type) {
            return Err(CoreError::invalid_resource_id(
                id,
                format!("the resource ID is of type {actual}, but the resource type is {resource_type}"),
            ));
        }
        let (parent_id, name) = split_parent(id)?;
        let resource_def = registry.resource_definition(&resource_type, &api_version);
        Ok(Self {
            name,
            parent_id,
            azure_resource_type: resource_type,
            api_version,
            azure_resource_id: id.trim_end_matches('/').to_string(),
            resource_def,
        })
    }

    /// Parses `id?api-version=...`, inferring the type from the id.
    pub fn with_api_version(input: &str, registry: &dyn SchemaRegistry) -> Result<Self> {
        let (id, api_version) = split_api_version(input);
        let api_version = api_version.ok_or_else(|| {
            CoreError::invalid_resource_id(input, "missing the \"api-version\" query parameter")
        })?;
        let resource_type = resource_type_of(&id)?;
        Self::with_resource_type(&id, &format!("{resource_type}@{api_version}"), registry)
    }

    pub fn id(&self) -> &str {
        &self.azure_resource_id
    }

    /// `<resource type>@<api version>`
    pub fn type_string(&self) -> String {
        format!("{}@{}", self.azure_resource_type, self.api_version)
    }

    /// The structural definition, or an error naming the api versions the registry knows.
    pub fn require_definition(&self, registry: &dyn SchemaRegistry) -> Result<Arc<ResourceDefinition>> {
        match &self.resource_def {
            Some(def) => Ok(def.clone()),
            None => require_definition(registry, &self.azure_resource_type, &self.api_version),
        }
    }
}

/// Looks up the definition of `resource_type@api_version`, failing with the
/// list of api versions the registry does know.
pub fn require_definition(
    registry: &dyn SchemaRegistry,
    resource_type: &str,
    api_version: &str,
) -> Result<Arc<ResourceDefinition>> {
    if let Some(def) = registry.resource_definition(resource_type, api_version) {
        return Ok(def);
    }
    let versions = registry.api_versions(resource_type);
    if versions.is_empty() {
        return Err(CoreError::invalid_resource_type(format!(
            "resource type {resource_type} can't be found"
        )));
    }
    Err(CoreError::invalid_resource_type(format!(
        "api-version {api_version} of resource type {resource_type} is not supported, the supported api-versions are: {}",
        versions.join(", ")
    )))
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resource: (ResourceId {:?} / Api Version {:?})",
            self.azure_resource_id, self.api_version
        )
    }
}
