//! Static checks of a resource configuration, run before any planning.

use std::sync::LazyLock;

use anyres_core::{is_resource_group_type, parse_type_string, validate_tags};
use regex::Regex;

use crate::attr::Attr;
use crate::body::{duplicated_definitions, parse_body};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ProviderError;
use crate::model::ResourceModel;
use crate::resource::GenericResource;

static USER_ASSIGNED_IDENTITY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^/subscriptions/[^/]+/resourceGroups/[^/]+/providers/Microsoft\.ManagedIdentity/userAssignedIdentities/[^/]+$",
    )
    .expect("valid user-assigned identity id pattern")
});

const DEPRECATED_ARGUMENTS: [(&str, &str); 3] = [
    ("body", "use \"payload\" instead"),
    (
        "ignore_body_changes",
        "use the lifecycle \"ignore_changes\" setting instead",
    ),
    (
        "ignore_casing",
        "it will be removed in a future release",
    ),
];

impl GenericResource {
    /// Checks `config` on its own and returns every finding.
    ///
    /// Attribute-level checks all run; the structural checks stop at the
    /// first failure since later ones depend on earlier ones.
    pub fn validate_config(&self, config: &ResourceModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        deprecation_warnings(config, &mut diags);
        attribute_errors(config, &mut diags);
        if let Err(err) = structural_checks(config) {
            diags.push(err.into());
        } else if let Some(body) = config.body.known() {
            // parse errors were reported above
            if let Ok(body) = parse_body(body) {
                diags.extend(
                    duplicated_definitions(config, &body)
                        .into_iter()
                        .map(Diagnostic::from),
                );
            }
        }
        diags
    }
}

fn deprecation_warnings(config: &ResourceModel, diags: &mut Diagnostics) {
    for (attribute, advice) in DEPRECATED_ARGUMENTS {
        let set = match attribute {
            "body" => !config.body.is_null(),
            "ignore_body_changes" => !config.ignore_body_changes.is_empty(),
            _ => config.ignore_casing,
        };
        if set {
            diags.push(
                Diagnostic::warning(
                    "Argument is deprecated",
                    format!("The argument \"{attribute}\" is deprecated, {advice}."),
                )
                .with_attribute(attribute),
            );
        }
    }
}

fn attribute_errors(config: &ResourceModel, diags: &mut Diagnostics) {
    let mut invalid = |attribute: &str, message: String| {
        diags.push(ProviderError::invalid_configuration(Some(attribute), message).into());
    };

    if let Err(err) = parse_type_string(&config.resource_type) {
        invalid("type", format!("The argument \"type\" is invalid: {err}"));
    }
    if let Attr::Known(parent_id) = &config.parent_id
        && !parent_id.starts_with('/')
    {
        invalid(
            "parent_id",
            format!("The argument \"parent_id\" is invalid: {parent_id:?} is not a resource ID"),
        );
    }
    if let Attr::Known(name) = &config.name
        && name.trim().is_empty()
    {
        invalid("name", "The argument \"name\" must not be empty".to_string());
    }
    if let Attr::Known(identity) = &config.identity {
        for id in identity.identity_ids_or_empty() {
            if !USER_ASSIGNED_IDENTITY_ID.is_match(id) {
                invalid(
                    "identity",
                    format!("{id:?} is not a user-assigned identity resource ID"),
                );
            }
        }
    }
    for (attribute, values) in [
        ("locks", &config.locks),
        ("ignore_body_changes", &config.ignore_body_changes),
        ("response_export_values", &config.response_export_values),
    ] {
        if values.iter().any(|v| v.trim().is_empty()) {
            invalid(
                attribute,
                format!("The argument \"{attribute}\" must not contain empty values"),
            );
        }
    }
    if let Attr::Known(tags) = &config.tags
        && let Err(err) = validate_tags(tags)
    {
        invalid("tags", err.to_string());
    }
}

fn structural_checks(config: &ResourceModel) -> Result<(), ProviderError> {
    if !config.body.is_null() && !config.payload.is_null() {
        return Err(ProviderError::invalid_configuration(
            None,
            "can't specify both body and payload",
        ));
    }

    if config.parent_id.is_null() {
        let resource_type = parse_type_string(&config.resource_type)
            .map(|(resource_type, _)| resource_type)
            .unwrap_or_default();
        if !is_resource_group_type(&resource_type) {
            return Err(ProviderError::missing_argument("parent_id"));
        }
    }

    match &config.body {
        Attr::Known(text) => parse_body(text).map(|_| ()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_assigned_identity_pattern() {
        assert!(USER_ASSIGNED_IDENTITY_ID.is_match(
            "/subscriptions/000/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/uai"
        ));
        assert!(USER_ASSIGNED_IDENTITY_ID.is_match(
            "/subscriptions/000/resourcegroups/rg/providers/microsoft.managedidentity/userassignedidentities/uai"
        ));
        assert!(!USER_ASSIGNED_IDENTITY_ID.is_match("/subscriptions/000/resourceGroups/rg"));
    }

    #[test]
    fn test_structural_checks_order() {
        let both = ResourceModel::new("Microsoft.Network/virtualNetworks@2023-04-01")
            .with_body("{")
            .with_payload(serde_json::json!({}));
        let err = structural_checks(&both).unwrap_err();
        assert_eq!(err.to_string(), "can't specify both body and payload");

        let no_parent = ResourceModel::new("Microsoft.Network/virtualNetworks@2023-04-01");
        assert_eq!(
            structural_checks(&no_parent).unwrap_err().attribute(),
            Some("parent_id")
        );

        let rg = ResourceModel::new("Microsoft.Resources/resourceGroups@2021-04-01");
        assert!(structural_checks(&rg).is_ok());
    }
}
