//! Request body assembly shared by validation, planning and apply.

use anyres_core::{expand_identity, expand_tags};
use serde_json::{Map, Value};

use crate::attr::Attr;
use crate::error::{ProviderError, Result};
use crate::model::ResourceModel;

/// Top-level properties that can also be set through a structured argument.
pub(crate) const STRUCTURED_PROPERTIES: [&str; 3] = ["tags", "location", "identity"];

/// Whether `body` declares `key` with a non-null value.
pub(crate) fn has_property(body: &Map<String, Value>, key: &str) -> bool {
    body.get(key).is_some_and(|v| !v.is_null())
}

/// Which of `body` and `payload` the model carries the request in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodySource {
    Body,
    Payload,
    Neither,
}

impl BodySource {
    pub(crate) fn of(model: &ResourceModel) -> Self {
        if !model.payload.is_null() {
            BodySource::Payload
        } else if !model.body.is_null() {
            BodySource::Body
        } else {
            BodySource::Neither
        }
    }
}

/// The request body declared by `model`: its payload, else its parsed body,
/// else an empty object.
pub(crate) fn request_body(model: &ResourceModel) -> Result<Map<String, Value>> {
    match BodySource::of(model) {
        BodySource::Payload => match &model.payload {
            Attr::Known(Value::Object(map)) => Ok(map.clone()),
            Attr::Known(Value::Null) => Ok(Map::new()),
            Attr::Known(other) => Err(ProviderError::invalid_configuration(
                Some("payload"),
                format!(
                    "The argument \"payload\" is invalid: value: {other}, err: expected a JSON object, got {}",
                    anyres_core::path::kind_of(other)
                ),
            )),
            _ => Err(not_known("payload")),
        },
        BodySource::Body => match &model.body {
            Attr::Known(text) => parse_body(text),
            _ => Err(not_known("body")),
        },
        BodySource::Neither => Ok(Map::new()),
    }
}

/// Parses the `body` argument. Empty text is an empty object.
pub(crate) fn parse_body(text: &str) -> Result<Map<String, Value>> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProviderError::invalid_json(
            "body",
            text,
            format!("expected a JSON object, got {}", anyres_core::path::kind_of(&other)),
        )),
        Err(err) => Err(ProviderError::invalid_json("body", text, err)),
    }
}

fn not_known(attribute: &str) -> ProviderError {
    ProviderError::invalid_configuration(
        Some(attribute),
        format!("The argument \"{attribute}\" is not known yet and cannot be sent"),
    )
}

/// Injects the model's known location, tags and identity into `body` where
/// the body does not declare them itself.
pub(crate) fn expand_body(body: &mut Map<String, Value>, model: &ResourceModel) -> Result<()> {
    if !has_property(body, "location")
        && let Attr::Known(location) = &model.location
    {
        body.insert("location".to_string(), Value::String(location.clone()));
    }
    if !has_property(body, "tags")
        && let Attr::Known(tags) = &model.tags
    {
        body.insert("tags".to_string(), expand_tags(tags));
    }
    if !has_property(body, "identity")
        && let Attr::Known(identity) = &model.identity
    {
        let expanded = expand_identity(identity).map_err(|err| {
            ProviderError::invalid_configuration(
                Some("identity"),
                format!(
                    "The argument \"identity\" is invalid: value: {:?}, err: {err}",
                    identity.identity_type.as_str()
                ),
            )
        })?;
        body.insert("identity".to_string(), expanded);
    }
    Ok(())
}

/// One error per property declared both as a structured argument and in the body.
pub(crate) fn duplicated_definitions(
    model: &ResourceModel,
    body: &Map<String, Value>,
) -> Vec<ProviderError> {
    let structured = [
        model.tags.is_known(),
        model.location.is_known(),
        model.identity.is_known(),
    ];
    STRUCTURED_PROPERTIES
        .iter()
        .zip(structured)
        .filter(|(name, set)| *set && has_property(body, name))
        .map(|(name, _)| {
            ProviderError::invalid_configuration(
                Some(*name),
                format!("can't specify both the argument \"{name}\" and \"{name}\" in the argument \"body\""),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyres_core::{IdentityModel, IdentityType, Tags};
    use serde_json::json;

    const RG: &str = "Microsoft.Resources/resourceGroups@2021-04-01";

    #[test]
    fn test_request_body_sources() {
        let model = ResourceModel::new(RG).with_body(r#"{"properties": {}}"#);
        assert_eq!(BodySource::of(&model), BodySource::Body);
        assert_eq!(Value::Object(request_body(&model).unwrap()), json!({"properties": {}}));

        let model = ResourceModel::new(RG).with_payload(json!({"kind": "x"}));
        assert_eq!(BodySource::of(&model), BodySource::Payload);
        assert_eq!(Value::Object(request_body(&model).unwrap()), json!({"kind": "x"}));

        let model = ResourceModel::new(RG);
        assert_eq!(BodySource::of(&model), BodySource::Neither);
        assert!(request_body(&model).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_bodies() {
        let err = request_body(&ResourceModel::new(RG).with_body("{not json")).unwrap_err();
        assert_eq!(err.summary(), "Invalid JSON string");
        assert!(request_body(&ResourceModel::new(RG).with_body("[1]")).is_err());
        assert!(request_body(&ResourceModel::new(RG).with_payload(json!("x"))).is_err());

        let mut unknown = ResourceModel::new(RG);
        unknown.body = Attr::Unknown;
        assert!(request_body(&unknown).is_err());
    }

    #[test]
    fn test_expand_body_keeps_declared_values() {
        let tags: Tags = [("env".to_string(), "dev".to_string())].into();
        let model = ResourceModel::new(RG)
            .with_location("westeurope")
            .with_tags(tags)
            .with_identity(IdentityModel::new(IdentityType::SystemAssigned));
        let mut body = parse_body(r#"{"location": "northeurope"}"#).unwrap();
        expand_body(&mut body, &model).unwrap();
        assert_eq!(
            Value::Object(body),
            json!({
                "location": "northeurope",
                "tags": {"env": "dev"},
                "identity": {"type": "SystemAssigned"}
            })
        );
    }

    #[test]
    fn test_expand_body_rejects_invalid_identity() {
        let model = ResourceModel::new(RG).with_identity(IdentityModel::new(IdentityType::UserAssigned));
        let err = expand_body(&mut Map::new(), &model).unwrap_err();
        assert_eq!(err.attribute(), Some("identity"));
    }

    #[test]
    fn test_duplicated_definitions() {
        let tags: Tags = [("env".to_string(), "prod".to_string())].into();
        let model = ResourceModel::new(RG).with_tags(tags).with_location("westeurope");
        let body = parse_body(r#"{"tags": {"env": "prod"}, "location": null}"#).unwrap();
        let errors = duplicated_definitions(&model, &body);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].attribute(), Some("tags"));
    }
}
