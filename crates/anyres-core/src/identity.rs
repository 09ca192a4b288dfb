//! Managed identity block <-> JSON body codec.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{CoreError, Result};

/// Kind of managed identity attached to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityType {
    #[serde(rename = "None")]
    None,
    #[serde(rename = "SystemAssigned")]
    SystemAssigned,
    #[serde(rename = "UserAssigned")]
    UserAssigned,
    #[serde(rename = "SystemAssigned, UserAssigned")]
    SystemAssignedUserAssigned,
}

impl IdentityType {
    pub const ALL: [IdentityType; 4] = [
        IdentityType::None,
        IdentityType::SystemAssigned,
        IdentityType::UserAssigned,
        IdentityType::SystemAssignedUserAssigned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityType::None => "None",
            IdentityType::SystemAssigned => "SystemAssigned",
            IdentityType::UserAssigned => "UserAssigned",
            IdentityType::SystemAssignedUserAssigned => "SystemAssigned, UserAssigned",
        }
    }

    /// Whether this kind references user-assigned identities.
    pub fn requires_identity_ids(&self) -> bool {
        matches!(
            self,
            IdentityType::UserAssigned | IdentityType::SystemAssignedUserAssigned
        )
    }
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityType {
    type Err = CoreError;

    /// Accepts any casing and optional whitespace around the comma of the combined kind.
    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_ascii_lowercase().as_str() {
            "none" => Ok(IdentityType::None),
            "systemassigned" => Ok(IdentityType::SystemAssigned),
            "userassigned" => Ok(IdentityType::UserAssigned),
            "systemassigned,userassigned" => Ok(IdentityType::SystemAssignedUserAssigned),
            _ => Err(CoreError::invalid_identity(format!(
                "unsupported identity type {s:?}, expected one of {}",
                IdentityType::ALL.map(|t| t.as_str()).join(", ")
            ))),
        }
    }
}

/// Structured identity block.
///
/// `identity_ids` distinguishes "not configured" (`None`) from an explicit empty
/// list. `principal_id` and `tenant_id` are assigned by the server.
///
/// The server keys user-assigned identities by id, so the id list is a set:
/// equality ignores its order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityModel {
    #[serde(rename = "type")]
    pub identity_type: IdentityType,
    #[serde(default)]
    pub identity_ids: Option<Vec<String>>,
    #[serde(default)]
    pub principal_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl IdentityModel {
    pub fn new(identity_type: IdentityType) -> Self {
        Self {
            identity_type,
            identity_ids: None,
            principal_id: None,
            tenant_id: None,
        }
    }

    pub fn with_identity_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn identity_ids_or_empty(&self) -> &[String] {
        self.identity_ids.as_deref().unwrap_or(&[])
    }

    /// True when both blocks declare the same kind and the same identities.
    /// Server-assigned ids are not compared.
    pub fn same_declaration(&self, other: &IdentityModel) -> bool {
        self.identity_type == other.identity_type && self.same_identity_ids(other)
    }

    /// Order-insensitive comparison of the user-assigned identity ids.
    pub fn same_identity_ids(&self, other: &IdentityModel) -> bool {
        match (&self.identity_ids, &other.identity_ids) {
            (None, None) => true,
            (Some(left), Some(right)) => {
                left.iter().collect::<BTreeSet<_>>() == right.iter().collect::<BTreeSet<_>>()
            }
            _ => false,
        }
    }
}

impl PartialEq for IdentityModel {
    fn eq(&self, other: &Self) -> bool {
        self.same_declaration(other)
            && self.principal_id == other.principal_id
            && self.tenant_id == other.tenant_id
    }
}

impl Eq for IdentityModel {}

/// Builds the `identity` body property for a structured identity block.
pub fn expand_identity(model: &IdentityModel) -> Result<Value> {
    let ids = model.identity_ids_or_empty();
    if model.identity_type.requires_identity_ids() {
        if ids.is_empty() {
            return Err(CoreError::invalid_identity(format!(
                "`identity_ids` must be specified when `type` is set to {:?}",
                model.identity_type.as_str()
            )));
        }
    } else if !ids.is_empty() {
        return Err(CoreError::invalid_identity(format!(
            "`identity_ids` can only be specified when `type` includes \"UserAssigned\", got {:?}",
            model.identity_type.as_str()
        )));
    }
    let mut seen = BTreeSet::new();
    if let Some(duplicate) = ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(CoreError::invalid_identity(format!(
            "`identity_ids` contains {duplicate:?} more than once"
        )));
    }

    let mut out = Map::new();
    out.insert("type".to_string(), json!(model.identity_type.as_str()));
    if model.identity_type.requires_identity_ids() {
        let assigned: Map<String, Value> = ids
            .iter()
            .map(|id| (id.clone(), Value::Object(Map::new())))
            .collect();
        out.insert("userAssignedIdentities".to_string(), Value::Object(assigned));
    }
    Ok(Value::Object(out))
}

/// Reads an `identity` body property back into a structured block.
///
/// Returns `None` when the value is absent, not an object, or carries no type.
/// User-assigned identity ids come back in sorted order.
pub fn flatten_identity(value: Option<&Value>) -> Option<IdentityModel> {
    let obj = value?.as_object()?;
    let raw_type = obj.get("type")?.as_str()?;
    if raw_type.trim().is_empty() {
        return None;
    }
    let identity_type = match raw_type.parse::<IdentityType>() {
        Ok(identity_type) => identity_type,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring identity with unrecognised type");
            return None;
        }
    };

    let identity_ids = obj
        .get("userAssignedIdentities")
        .and_then(Value::as_object)
        .map(|assigned| {
            let mut ids: Vec<String> = assigned.keys().cloned().collect();
            ids.sort();
            ids
        });

    Some(IdentityModel {
        identity_type,
        identity_ids,
        principal_id: non_empty_string(obj.get("principalId")),
        tenant_id: non_empty_string(obj.get("tenantId")),
    })
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UAI_A: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/a";
    const UAI_B: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/b";

    #[test]
    fn test_parse_identity_type() {
        assert_eq!(
            "systemassigned".parse::<IdentityType>().unwrap(),
            IdentityType::SystemAssigned
        );
        assert_eq!(
            "SystemAssigned,UserAssigned".parse::<IdentityType>().unwrap(),
            IdentityType::SystemAssignedUserAssigned
        );
        assert!("Managed".parse::<IdentityType>().is_err());
    }

    #[test]
    fn test_expand_user_assigned() {
        let model = IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_A]);
        let out = expand_identity(&model).unwrap();
        assert_eq!(
            out,
            json!({"type": "UserAssigned", "userAssignedIdentities": {UAI_A: {}}})
        );
    }

    #[test]
    fn test_expand_errors() {
        let missing = IdentityModel::new(IdentityType::UserAssigned);
        assert!(expand_identity(&missing).is_err());

        let unexpected = IdentityModel::new(IdentityType::None).with_identity_ids([UAI_A]);
        assert!(expand_identity(&unexpected).is_err());

        let unexpected = IdentityModel::new(IdentityType::SystemAssigned).with_identity_ids([UAI_A]);
        assert!(expand_identity(&unexpected).is_err());

        let duplicated =
            IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_A, UAI_B, UAI_A]);
        let err = expand_identity(&duplicated).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_expand_none_with_empty_ids() {
        let model = IdentityModel::new(IdentityType::None).with_identity_ids(Vec::<String>::new());
        assert_eq!(expand_identity(&model).unwrap(), json!({"type": "None"}));
    }

    #[test]
    fn test_flatten_reads_server_fields() {
        let body = json!({
            "type": "SystemAssigned, UserAssigned",
            "principalId": "p-1",
            "tenantId": "t-1",
            "userAssignedIdentities": {UAI_B: {"clientId": "c"}, UAI_A: {}}
        });
        let model = flatten_identity(Some(&body)).unwrap();
        assert_eq!(model.identity_type, IdentityType::SystemAssignedUserAssigned);
        assert_eq!(model.identity_ids, Some(vec![UAI_A.to_string(), UAI_B.to_string()]));
        assert_eq!(model.principal_id.as_deref(), Some("p-1"));
        assert_eq!(model.tenant_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn test_flatten_absent() {
        assert!(flatten_identity(None).is_none());
        assert!(flatten_identity(Some(&Value::Null)).is_none());
        assert!(flatten_identity(Some(&json!({"principalId": "x"}))).is_none());
        assert!(flatten_identity(Some(&json!({"type": ""}))).is_none());
    }

    #[test]
    fn test_round_trip() {
        let models = [
            IdentityModel::new(IdentityType::None),
            IdentityModel::new(IdentityType::SystemAssigned),
            IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_A, UAI_B]),
            IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_B, UAI_A]),
            IdentityModel::new(IdentityType::SystemAssignedUserAssigned).with_identity_ids([UAI_B]),
        ];
        for model in models {
            let expanded = expand_identity(&model).unwrap();
            assert_eq!(flatten_identity(Some(&expanded)), Some(model));
        }
    }

    #[test]
    fn test_identity_ids_compare_as_set() {
        let ordered = IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_A, UAI_B]);
        let reversed = IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_B, UAI_A]);
        assert!(ordered.same_declaration(&reversed));
        assert_eq!(ordered, reversed);

        let fewer = IdentityModel::new(IdentityType::UserAssigned).with_identity_ids([UAI_A]);
        assert_ne!(ordered, fewer);

        let empty = IdentityModel::new(IdentityType::None).with_identity_ids(Vec::<String>::new());
        assert_ne!(empty, IdentityModel::new(IdentityType::None));
    }
}
