//! Plan computation: the proposed next state, derived before any mutating call.
//!
//! Planning is a pure function of the configuration, the prior state and the
//! provider defaults: no backend request is made, so planning the same
//! inputs twice yields the same result.

use anyres_core::{
    ResourceDefinition, is_resource_group_type, normalize_json, normalize_location,
    parse_type_string, require_definition, same_location, semantically_equal,
};
use serde_json::{Map, Value};

use crate::attr::Attr;
use crate::body::{BodySource, expand_body, has_property, request_body};
use crate::error::{ProviderError, Result};
use crate::model::ResourceModel;
use crate::resource::GenericResource;

/// Result of [`GenericResource::plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResponse {
    pub planned_state: ResourceModel,
    /// Attributes whose change forces destroy-and-recreate.
    pub requires_replace: Vec<String>,
}

impl PlanResponse {
    pub fn requires_replace(&self) -> bool {
        !self.requires_replace.is_empty()
    }
}

impl GenericResource {
    /// Computes the planned state for `config` given the prior `state`
    /// (`None` on first creation).
    pub fn plan(&self, config: &ResourceModel, state: Option<&ResourceModel>) -> Result<PlanResponse> {
        let mut plan = proposed_new_state(config, state);
        let mut requires_replace = Vec::new();

        let (resource_type, api_version) = parse_type_string(&config.resource_type).map_err(|err| {
            ProviderError::invalid_configuration(
                Some("type"),
                format!("The argument \"type\" is invalid: {err}"),
            )
        })?;
        if let Some(state) = state
            && let Ok((prior_type, _)) = parse_type_string(&state.resource_type)
            && !prior_type.eq_ignore_ascii_case(&resource_type)
        {
            requires_replace.push("type".to_string());
        }

        if config.parent_id.is_null() && is_resource_group_type(&resource_type) {
            plan.parent_id = Attr::Known(format!("/subscriptions/{}", self.data().subscription_id));
        }
        if let Some(state) = state
            && plan.parent_id.is_known()
            && state.parent_id.is_known()
            && state.parent_id != plan.parent_id
        {
            requires_replace.push("parent_id".to_string());
        }

        plan.name = self.name_with_default_naming(&config.name)?;
        if let Some(state) = state
            && state.name != plan.name
        {
            requires_replace.push("name".to_string());
        }

        // an unchanged identity declaration keeps the server-assigned ids
        if let (Attr::Known(configured), Some(state)) = (&config.identity, state)
            && let Attr::Known(prior) = &state.identity
            && configured.same_declaration(prior)
        {
            plan.identity = state.identity.clone();
        }

        if plan.body.is_unknown() || plan.payload.is_unknown() {
            if config.tags.is_null() {
                plan.tags = Attr::Unknown;
            }
            if config.location.is_null() {
                plan.location = Attr::Unknown;
            }
            plan.output = Attr::Unknown;
            plan.output_payload = Attr::Unknown;
            return Ok(PlanResponse {
                planned_state: plan,
                requires_replace,
            });
        }

        let output_stale = match state {
            None => true,
            Some(state) => {
                plan.identity != state.identity
                    || plan.response_export_values != state.response_export_values
                    || normalize_json(plan.body.value_str()) != normalize_json(state.body.value_str())
                    || !payload_equal(&plan.payload, &state.payload)
            }
        };
        if output_stale {
            mark_output_unknown(&mut plan);
        }

        let mut body = request_body(&plan)?;
        let definition = self
            .data()
            .registry
            .resource_definition(&resource_type, &api_version);

        plan.tags = self.tags_with_default_tags(&config.tags, &body, state, definition.as_deref());
        if plan.tags.is_null()
            && let Some(state) = state
            && state.tags.is_known()
        {
            plan.tags = state.tags.clone();
        }
        if state.is_none_or(|state| state.tags != plan.tags) {
            mark_output_unknown(&mut plan);
        }

        let configured_location = if plan.location.is_unknown() || config.location.is_null() {
            config.location.clone()
        } else {
            plan.location.clone()
        };
        plan.location = self.location_with_default_location(
            configured_location,
            &body,
            state,
            definition.as_deref(),
        );
        if let Some(state) = state {
            if plan.location.is_null() && state.location.is_known() {
                plan.location = state.location.clone();
            }
            if plan.location.is_known()
                && normalize_location(state.location.value_str())
                    != normalize_location(plan.location.value_str())
            {
                tracing::debug!(
                    from = state.location.value_str(),
                    to = plan.location.value_str(),
                    "location changed, resource requires replacement"
                );
                requires_replace.push("location".to_string());
            }
        }

        if plan.schema_validation_enabled {
            expand_body(&mut body, &plan)?;
            body.insert(
                "name".to_string(),
                Value::String(plan.name.value_str().to_string()),
            );
            let attribute = match BodySource::of(&plan) {
                BodySource::Payload => "payload",
                _ => "body",
            };
            self.schema_validation(&resource_type, &api_version, definition.as_deref(), attribute, body)?;
        } else if definition.is_none() {
            tracing::warn!(
                resource_type = %resource_type,
                api_version = %api_version,
                "no resource definition known, the body is sent unchecked"
            );
        }

        Ok(PlanResponse {
            planned_state: plan,
            requires_replace,
        })
    }

    fn name_with_default_naming(&self, config: &Attr<String>) -> Result<Attr<String>> {
        if !config.is_null() {
            return Ok(config.clone());
        }
        match &self.data().features.default_naming {
            Some(name) if !name.is_empty() => Ok(Attr::Known(name.clone())),
            _ => Err(ProviderError::missing_argument("name")),
        }
    }

    /// Tags to plan when `config` does not set them: the body's own tags,
    /// else the provider's default tags (if the type can carry tags), else
    /// the prior empty tags so `null` and `{}` do not diff.
    fn tags_with_default_tags(
        &self,
        config: &Attr<anyres_core::Tags>,
        body: &Map<String, Value>,
        state: Option<&ResourceModel>,
        definition: Option<&ResourceDefinition>,
    ) -> Attr<anyres_core::Tags> {
        if !config.is_null() {
            return config.clone();
        }
        let defaults = &self.data().features.default_tags;
        if has_property(body, "tags") {
            Attr::Known(anyres_core::flatten_tags(body.get("tags")))
        } else if !defaults.is_empty() && can_have_property(definition, "tags") {
            match state.map(|s| &s.tags) {
                Some(Attr::Known(current)) if current == defaults => Attr::Known(current.clone()),
                _ => {
                    tracing::debug!(tags = ?defaults, "applying default tags");
                    Attr::Known(defaults.clone())
                }
            }
        } else if let Some(state) = state
            && state.tags.known().is_some_and(|t| t.is_empty())
        {
            state.tags.clone()
        } else {
            config.clone()
        }
    }

    fn location_with_default_location(
        &self,
        config: Attr<String>,
        body: &Map<String, Value>,
        state: Option<&ResourceModel>,
        definition: Option<&ResourceDefinition>,
    ) -> Attr<String> {
        if !config.is_null() {
            return config;
        }
        if let Some(location) = body.get("location").filter(|v| !v.is_null()) {
            let location = match location {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Attr::Known(location);
        }
        match &self.data().features.default_location {
            Some(default) if can_have_property(definition, "location") => {
                match state.map(|s| &s.location) {
                    Some(Attr::Known(current)) if same_location(current, default) => {
                        Attr::Known(current.clone())
                    }
                    _ => {
                        tracing::debug!(location = %default, "applying default location");
                        Attr::Known(default.clone())
                    }
                }
            }
            _ => config,
        }
    }

    fn schema_validation(
        &self,
        resource_type: &str,
        api_version: &str,
        definition: Option<&ResourceDefinition>,
        attribute: &str,
        body: Map<String, Value>,
    ) -> Result<()> {
        let found;
        let definition = match definition {
            Some(definition) => definition,
            None => {
                found = require_definition(self.data().registry.as_ref(), resource_type, api_version)
                    .map_err(|err| ProviderError::invalid_configuration(Some("type"), err.to_string()))?;
                found.as_ref()
            }
        };

        let errors = definition.validate(&Value::Object(body));
        if errors.is_empty() {
            return Ok(());
        }
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Err(ProviderError::invalid_configuration(
            Some(attribute),
            format!(
                "embedded schema validation failed: the argument \"{attribute}\" is invalid:\n{}",
                details.join("\n")
            ),
        ))
    }
}

/// Field-level plan: configuration plus the computed values carried over
/// from the prior state, and the prior spelling of semantically equal values.
fn proposed_new_state(config: &ResourceModel, state: Option<&ResourceModel>) -> ResourceModel {
    let mut plan = config.clone();
    let Some(state) = state else {
        plan.id = Attr::Unknown;
        mark_output_unknown(&mut plan);
        return plan;
    };

    plan.id = state.id.clone();
    plan.output = state.output.clone();
    plan.output_payload = state.output_payload.clone();
    if config.parent_id.is_null() {
        plan.parent_id = state.parent_id.clone();
    }
    if let (Attr::Known(configured), Attr::Known(prior)) = (&config.location, &state.location)
        && same_location(configured, prior)
    {
        plan.location = state.location.clone();
    }
    if let (Attr::Known(configured), Attr::Known(prior)) = (&config.body, &state.body)
        && normalize_json(configured) == normalize_json(prior)
    {
        plan.body = state.body.clone();
    }
    if payload_equal(&config.payload, &state.payload) && config.payload.is_known() {
        plan.payload = state.payload.clone();
    }
    plan
}

fn payload_equal(a: &Attr<Value>, b: &Attr<Value>) -> bool {
    match (a, b) {
        (Attr::Known(a), Attr::Known(b)) => semantically_equal(a, b),
        _ => a == b,
    }
}

fn mark_output_unknown(plan: &mut ResourceModel) {
    plan.output = Attr::Unknown;
    plan.output_payload = Attr::Unknown;
}

/// Without a definition nothing is known to carry the property.
fn can_have_property(definition: Option<&ResourceDefinition>, name: &str) -> bool {
    definition.is_some_and(|def| def.can_have_property(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proposed_state_keeps_prior_spelling() {
        let state = ResourceModel::new("Microsoft.Foo/bars@2021-01-01")
            .with_location("West Europe")
            .with_body(r#"{"b": 1, "a": 2}"#)
            .with_parent_id("/subscriptions/000/resourceGroups/rg");
        let config = ResourceModel::new("Microsoft.Foo/bars@2021-01-01")
            .with_location("westeurope")
            .with_body(r#"{"a":2,"b":1.0}"#);

        let plan = proposed_new_state(&config, Some(&state));
        assert_eq!(plan.location, state.location);
        assert_eq!(plan.body, state.body);
        assert_eq!(plan.parent_id, state.parent_id);
    }

    #[test]
    fn test_proposed_state_for_create() {
        let config = ResourceModel::new("Microsoft.Foo/bars@2021-01-01").with_payload(json!({}));
        let plan = proposed_new_state(&config, None);
        assert!(plan.id.is_unknown());
        assert!(plan.output.is_unknown());
        assert!(plan.output_payload.is_unknown());
    }

    #[test]
    fn test_payload_equal() {
        assert!(payload_equal(
            &Attr::Known(json!({"a": 1.0})),
            &Attr::Known(json!({"a": 1}))
        ));
        assert!(payload_equal(&Attr::Null, &Attr::Null));
        assert!(!payload_equal(&Attr::Known(json!({})), &Attr::Null));
    }

    #[test]
    fn test_can_have_property_without_definition() {
        assert!(!can_have_property(None, "tags"));
    }
}
