use std::time::Duration;

use anyres_config::TimeoutsConfig;
use anyres_core::{IdentityModel, Tags};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attr::Attr;

/// User- and state-facing representation of one generic resource.
///
/// `body` and `payload` are never both non-null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel {
    #[serde(default)]
    pub id: Attr<String>,
    #[serde(default)]
    pub name: Attr<String>,
    #[serde(default)]
    pub parent_id: Attr<String>,
    /// `<resource type>@<api version>`
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub location: Attr<String>,
    #[serde(default)]
    pub identity: Attr<IdentityModel>,
    /// Request body as JSON text.
    #[serde(default)]
    pub body: Attr<String>,
    /// Request body as a structured value.
    #[serde(default)]
    pub payload: Attr<Value>,
    #[serde(default)]
    pub locks: Vec<String>,
    #[serde(default)]
    pub ignore_body_changes: Vec<String>,
    #[serde(default)]
    pub ignore_casing: bool,
    #[serde(default = "default_true")]
    pub ignore_missing_property: bool,
    #[serde(default = "default_true")]
    pub schema_validation_enabled: bool,
    #[serde(default)]
    pub response_export_values: Vec<String>,
    #[serde(default)]
    pub output: Attr<String>,
    #[serde(default)]
    pub output_payload: Attr<Value>,
    #[serde(default)]
    pub tags: Attr<Tags>,
    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_true() -> bool {
    true
}

impl Default for ResourceModel {
    fn default() -> Self {
        Self {
            id: Attr::Null,
            name: Attr::Null,
            parent_id: Attr::Null,
            resource_type: String::new(),
            location: Attr::Null,
            identity: Attr::Null,
            body: Attr::Null,
            payload: Attr::Null,
            locks: Vec::new(),
            ignore_body_changes: Vec::new(),
            ignore_casing: false,
            ignore_missing_property: true,
            schema_validation_enabled: true,
            response_export_values: Vec::new(),
            output: Attr::Null,
            output_payload: Attr::Null,
            tags: Attr::Null,
            timeouts: Timeouts::default(),
        }
    }
}

impl ResourceModel {
    /// A configuration of `resource_type` with every other attribute defaulted.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Attr::Known(name.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Attr::Known(parent_id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Attr::Known(location.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Attr::Known(body.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Attr::Known(payload);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Attr::Known(tags);
        self
    }

    pub fn with_identity(mut self, identity: IdentityModel) -> Self {
        self.identity = Attr::Known(identity);
        self
    }
}

/// Per-resource deadlines; unset values fall back to the provider's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default, with = "humantime_serde")]
    pub create: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub read: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub delete: Option<Duration>,
}

impl Timeouts {
    /// Also bounds updates.
    pub fn create(&self, defaults: &TimeoutsConfig) -> Duration {
        self.create.unwrap_or_else(|| defaults.create())
    }

    pub fn read(&self, defaults: &TimeoutsConfig) -> Duration {
        self.read.unwrap_or_else(|| defaults.read())
    }

    pub fn delete(&self, defaults: &TimeoutsConfig) -> Duration {
        self.delete.unwrap_or_else(|| defaults.delete())
    }
}
