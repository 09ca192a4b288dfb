//! Structural definitions of resource bodies.
//!
//! A definition is optional and discovered at runtime: it is looked up by
//! `(resource type, api version)` in a [`SchemaRegistry`] and queried by key and
//! path, never through per-type code.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::kind_of;

/// Shape of a JSON value in a resource body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypeDefinition {
    Any,
    String {
        #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
        allowed_values: Vec<String>,
    },
    Integer,
    Number,
    Boolean,
    Array {
        items: Box<TypeDefinition>,
    },
    Object(ObjectDefinition),
}

/// Properties of an object. An object without declared properties and without
/// `additionalProperties` accepts anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDefinition {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<TypeDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    #[serde(flatten)]
    pub ty: TypeDefinition,
    /// Set by the server, never accepted from clients.
    #[serde(default)]
    pub read_only: bool,
    /// Accepted from clients, never returned by the server.
    #[serde(default)]
    pub write_only: bool,
    #[serde(default)]
    pub required: bool,
}

impl PropertyDefinition {
    pub fn new(ty: TypeDefinition) -> Self {
        Self {
            ty,
            read_only: false,
            write_only: false,
            required: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Structural definition of one `(resource type, api version)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub resource_type: String,
    pub api_version: String,
    #[serde(default)]
    pub body: ObjectDefinition,
}

/// A structural violation found by [`ResourceDefinition::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.path, self.message)
    }
}

impl ResourceDefinition {
    pub fn new(resource_type: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            api_version: api_version.into(),
            body: ObjectDefinition::default(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, property: PropertyDefinition) -> Self {
        self.body.properties.insert(name.into(), property);
        self
    }

    /// Whether the top-level body of this resource declares `name`
    /// (used for `tags` and `location` defaults).
    pub fn can_have_property(&self, name: &str) -> bool {
        self.body.properties.contains_key(name)
    }

    /// Returns the part of `body` a client is allowed to send: every property the
    /// definition marks read-only is removed, recursively through objects, arrays
    /// and maps. Properties the definition does not know are kept.
    pub fn get_write_only(&self, body: &Value) -> Value {
        strip_object(&self.body, body, &|property| property.read_only)
    }

    /// Removes every property the definition marks write-only. The server
    /// never echoes these, so observed and imported state must not claim them.
    pub fn without_write_only(&self, body: &Value) -> Value {
        strip_object(&self.body, body, &|property| property.write_only)
    }

    /// Checks `body` against the definition and returns every violation found.
    pub fn validate(&self, body: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        validate_object(&self.body, body, "", &mut errors);
        errors
    }
}

/// Read-only source of structural definitions and known api versions.
pub trait SchemaRegistry: Send + Sync {
    /// Definition for a resource type at an api version, matched case-insensitively.
    fn resource_definition(
        &self,
        resource_type: &str,
        api_version: &str,
    ) -> Option<Arc<ResourceDefinition>>;

    /// Known api versions of a resource type, oldest first.
    fn api_versions(&self, resource_type: &str) -> Vec<String>;

    /// Newest known api version of a resource type.
    fn latest_api_version(&self, resource_type: &str) -> Option<String> {
        self.api_versions(resource_type).pop()
    }
}

type Dropped<'a> = &'a dyn Fn(&PropertyDefinition) -> bool;

fn strip(ty: &TypeDefinition, value: &Value, dropped: Dropped<'_>) -> Value {
    match (ty, value) {
        (TypeDefinition::Object(def), Value::Object(_)) => strip_object(def, value, dropped),
        (TypeDefinition::Array { items }, Value::Array(values)) => {
            Value::Array(values.iter().map(|v| strip(items, v, dropped)).collect())
        }
        _ => value.clone(),
    }
}

fn strip_object(def: &ObjectDefinition, value: &Value, dropped: Dropped<'_>) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let mut out = Map::new();
    for (key, item) in map {
        match def.properties.get(key) {
            Some(property) if dropped(property) => {}
            Some(property) => {
                out.insert(key.clone(), strip(&property.ty, item, dropped));
            }
            None => match &def.additional_properties {
                Some(additional) => {
                    out.insert(key.clone(), strip(additional, item, dropped));
                }
                None => {
                    out.insert(key.clone(), item.clone());
                }
            },
        }
    }
    Value::Object(out)
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn validate_value(ty: &TypeDefinition, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    if value.is_null() {
        return;
    }
    let mismatch = |expected: &str| ValidationError {
        path: path.to_string(),
        message: format!("is invalid, expected {expected}, got {}", kind_of(value)),
    };
    match ty {
        TypeDefinition::Any => {}
        TypeDefinition::String { allowed_values } => match value.as_str() {
            Some(s) => {
                if !allowed_values.is_empty()
                    && !allowed_values.iter().any(|a| a.eq_ignore_ascii_case(s))
                {
                    errors.push(ValidationError {
                        path: path.to_string(),
                        message: format!(
                            "is invalid, expected one of [{}], got {s:?}",
                            allowed_values.join(", ")
                        ),
                    });
                }
            }
            None => errors.push(mismatch("a string")),
        },
        TypeDefinition::Integer => {
            let integral = value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0);
            if !integral {
                errors.push(mismatch("an integer"));
            }
        }
        TypeDefinition::Number => {
            if !value.is_number() {
                errors.push(mismatch("a number"));
            }
        }
        TypeDefinition::Boolean => {
            if !value.is_boolean() {
                errors.push(mismatch("a boolean"));
            }
        }
        TypeDefinition::Array { items } => match value.as_array() {
            Some(values) => {
                for (index, item) in values.iter().enumerate() {
                    validate_value(items, item, &join(path, &index.to_string()), errors);
                }
            }
            None => errors.push(mismatch("an array")),
        },
        TypeDefinition::Object(def) => {
            if value.is_object() {
                validate_object(def, value, path, errors);
            } else {
                errors.push(mismatch("an object"));
            }
        }
    }
}

fn validate_object(
    def: &ObjectDefinition,
    value: &Value,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let Value::Object(map) = value else {
        errors.push(ValidationError {
            path: if path.is_empty() { "$".to_string() } else { path.to_string() },
            message: format!("is invalid, expected an object, got {}", kind_of(value)),
        });
        return;
    };

    for (name, property) in &def.properties {
        if property.required && map.get(name).is_none_or(Value::is_null) {
            errors.push(ValidationError {
                path: join(path, name),
                message: "is required, but no definition was found".to_string(),
            });
        }
    }

    let open = def.properties.is_empty() && def.additional_properties.is_none();
    for (key, item) in map {
        let child = join(path, key);
        if let Some(property) = def.properties.get(key) {
            validate_value(&property.ty, item, &child, errors);
        } else if let Some(additional) = &def.additional_properties {
            validate_value(additional, item, &child, errors);
        } else if !open {
            let hint = def
                .properties
                .keys()
                .find(|candidate| candidate.eq_ignore_ascii_case(key))
                .map(|candidate| format!(", did you mean `{}`?", join(path, candidate)))
                .unwrap_or_default();
            errors.push(ValidationError {
                path: child,
                message: format!("is not expected here{hint}"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vnet_definition() -> ResourceDefinition {
        let subnet = ObjectDefinition {
            properties: BTreeMap::from([
                ("name".to_string(), PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] })),
                ("provisioningState".to_string(), PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }).read_only()),
            ]),
            additional_properties: None,
        };
        let properties = ObjectDefinition {
            properties: BTreeMap::from([
                (
                    "subnets".to_string(),
                    PropertyDefinition::new(TypeDefinition::Array {
                        items: Box::new(TypeDefinition::Object(subnet)),
                    }),
                ),
                ("provisioningState".to_string(), PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }).read_only()),
                ("enableDdos".to_string(), PropertyDefinition::new(TypeDefinition::Boolean)),
            ]),
            additional_properties: None,
        };
        ResourceDefinition::new("Microsoft.Network/virtualNetworks", "2023-04-01")
            .with_property("name", PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }).required())
            .with_property("location", PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }))
            .with_property(
                "tags",
                PropertyDefinition::new(TypeDefinition::Object(ObjectDefinition {
                    properties: BTreeMap::new(),
                    additional_properties: Some(Box::new(TypeDefinition::String { allowed_values: vec![] })),
                })),
            )
            .with_property("id", PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }).read_only())
            .with_property("properties", PropertyDefinition::new(TypeDefinition::Object(properties)))
    }

    #[test]
    fn test_can_have_property() {
        let def = vnet_definition();
        assert!(def.can_have_property("tags"));
        assert!(def.can_have_property("location"));
        assert!(!def.can_have_property("identity"));
    }

    #[test]
    fn test_get_write_only_strips_read_only() {
        let def = vnet_definition();
        let body = json!({
            "id": "/subscriptions/x",
            "name": "vnet",
            "properties": {
                "provisioningState": "Succeeded",
                "subnets": [{"name": "default", "provisioningState": "Succeeded"}],
                "unknownToDefinition": 1
            }
        });
        assert_eq!(
            def.get_write_only(&body),
            json!({
                "name": "vnet",
                "properties": {
                    "subnets": [{"name": "default"}],
                    "unknownToDefinition": 1
                }
            })
        );
    }

    #[test]
    fn test_without_write_only() {
        let def = ResourceDefinition::new("Microsoft.Sql/servers", "2021-11-01")
            .with_property("location", PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }))
            .with_property(
                "properties",
                PropertyDefinition::new(TypeDefinition::Object(ObjectDefinition {
                    properties: BTreeMap::from([(
                        "administratorLoginPassword".to_string(),
                        PropertyDefinition::new(TypeDefinition::String { allowed_values: vec![] }).write_only(),
                    )]),
                    additional_properties: None,
                })),
            );
        let body = json!({
            "location": "westeurope",
            "properties": {"administratorLoginPassword": "secret", "version": "12.0"}
        });
        assert_eq!(
            def.without_write_only(&body),
            json!({"location": "westeurope", "properties": {"version": "12.0"}})
        );
        assert_eq!(def.get_write_only(&body), body);
    }

    #[test]
    fn test_validate_accepts_valid_body() {
        let def = vnet_definition();
        let body = json!({
            "name": "vnet",
            "location": "westeurope",
            "tags": {"env": "prod"},
            "properties": {"subnets": [{"name": "a"}], "enableDdos": false}
        });
        assert!(def.validate(&body).is_empty());
    }

    #[test]
    fn test_validate_reports_violations() {
        let def = vnet_definition();
        let body = json!({
            "location": 3,
            "tags": {"env": true},
            "properties": {"EnableDdos": true, "subnets": "nope"}
        });
        let errors: Vec<String> = def.validate(&body).iter().map(ToString::to_string).collect();
        assert!(errors.contains(&"`name` is required, but no definition was found".to_string()));
        assert!(errors.contains(&"`location` is invalid, expected a string, got number".to_string()));
        assert!(errors.contains(&"`tags.env` is invalid, expected a string, got boolean".to_string()));
        assert!(errors.contains(
            &"`properties.EnableDdos` is not expected here, did you mean `properties.enableDdos`?"
                .to_string()
        ));
        assert!(errors.contains(
            &"`properties.subnets` is invalid, expected an array, got string".to_string()
        ));
    }

    #[test]
    fn test_enum_is_case_insensitive() {
        let def = ResourceDefinition::new("Microsoft.Storage/storageAccounts", "2023-01-01")
            .with_property(
                "kind",
                PropertyDefinition::new(TypeDefinition::String {
                    allowed_values: vec!["StorageV2".to_string(), "BlobStorage".to_string()],
                }),
            );
        assert!(def.validate(&json!({"kind": "storagev2"})).is_empty());
        assert_eq!(def.validate(&json!({"kind": "FileStorage"})).len(), 1);
    }

    #[test]
    fn test_definition_from_json() {
        let def: ResourceDefinition = serde_json::from_value(json!({
            "resourceType": "Microsoft.Resources/resourceGroups",
            "apiVersion": "2020-06-01",
            "body": {
                "properties": {
                    "location": {"type": "string", "required": true},
                    "managedBy": {"type": "string"},
                    "properties": {
                        "type": "object",
                        "properties": {"provisioningState": {"type": "string", "readOnly": true}}
                    }
                }
            }
        }))
        .unwrap();
        assert!(def.can_have_property("location"));
        assert!(def.body.properties["location"].required);
        assert_eq!(
            def.get_write_only(&json!({"location": "x", "properties": {"provisioningState": "Succeeded"}})),
            json!({"location": "x", "properties": {}})
        );
    }
}
