//! Tag mapping <-> JSON body codec.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

pub const MAX_TAGS: usize = 50;
pub const MAX_TAG_KEY_LENGTH: usize = 512;
pub const MAX_TAG_VALUE_LENGTH: usize = 256;

pub type Tags = BTreeMap<String, String>;

pub fn expand_tags(tags: &Tags) -> Value {
    Value::Object(
        tags.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>(),
    )
}

/// Reads the `tags` body property. Absent, `null` and `{}` all flatten to an
/// empty map; non-string values are rendered as their JSON text.
pub fn flatten_tags(value: Option<&Value>) -> Tags {
    let Some(Value::Object(map)) = value else {
        return Tags::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), text)
        })
        .collect()
}

/// Checks the backend's tag limits.
pub fn validate_tags(tags: &Tags) -> Result<()> {
    if tags.len() > MAX_TAGS {
        return Err(CoreError::invalid_tags(format!(
            "a maximum of {MAX_TAGS} tags can be applied to each resource, got {}",
            tags.len()
        )));
    }
    for (key, value) in tags {
        if key.chars().count() > MAX_TAG_KEY_LENGTH {
            return Err(CoreError::invalid_tags(format!(
                "the maximum length for a tag key is {MAX_TAG_KEY_LENGTH} characters: {key:?}"
            )));
        }
        if value.chars().count() > MAX_TAG_VALUE_LENGTH {
            return Err(CoreError::invalid_tags(format!(
                "the maximum length for a tag value is {MAX_TAG_VALUE_LENGTH} characters: tag {key:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expand_and_flatten() {
        let tags: Tags = [("env".to_string(), "prod".to_string())].into();
        let expanded = expand_tags(&tags);
        assert_eq!(expanded, json!({"env": "prod"}));
        assert_eq!(flatten_tags(Some(&expanded)), tags);
    }

    #[test]
    fn test_flatten_empty_representations() {
        assert!(flatten_tags(None).is_empty());
        assert!(flatten_tags(Some(&Value::Null)).is_empty());
        assert!(flatten_tags(Some(&json!({}))).is_empty());
        assert!(flatten_tags(Some(&json!("nope"))).is_empty());
    }

    #[test]
    fn test_flatten_non_string_values() {
        let tags = flatten_tags(Some(&json!({"count": 3, "gone": null})));
        assert_eq!(tags.get("count").map(String::as_str), Some("3"));
        assert!(!tags.contains_key("gone"));
    }

    #[test]
    fn test_validate_tags() {
        let mut tags = Tags::new();
        tags.insert("k".repeat(MAX_TAG_KEY_LENGTH + 1), "v".to_string());
        assert!(validate_tags(&tags).is_err());

        let too_many: Tags = (0..=MAX_TAGS).map(|i| (format!("k{i}"), "v".to_string())).collect();
        assert!(validate_tags(&too_many).is_err());

        let ok: Tags = [("env".to_string(), "v".repeat(MAX_TAG_VALUE_LENGTH))].into();
        assert!(validate_tags(&ok).is_ok());
    }
}
