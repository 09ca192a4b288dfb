//! Selection of response values exported through `output`.

use anyres_core::JsonPath;
use serde_json::{Map, Value};

/// Exports the whole response.
pub const EXPORT_ALL: &str = "*";

/// Builds the exported value: `"*"` selects the whole response, any other
/// selector is a dotted path whose value is copied under the same nesting.
/// Paths missing from the response, and selectors that do not parse, are
/// skipped. No selectors yield `{}`.
pub fn flatten_output_payload(response: &Value, selectors: &[String]) -> Value {
    if selectors.iter().any(|s| s == EXPORT_ALL) {
        return response.clone();
    }
    let mut out = Value::Object(Map::new());
    for selector in selectors {
        let Ok(path) = JsonPath::parse(selector) else {
            tracing::debug!(selector, "skipping unparsable response export selector");
            continue;
        };
        if let Some(value) = path.get(response)
            && let Err(err) = path.set(&mut out, value.clone())
        {
            tracing::debug!(selector, error = %err, "skipping conflicting response export selector");
        }
    }
    out
}

/// JSON text of [`flatten_output_payload`].
pub fn flatten_output(response: &Value, selectors: &[String]) -> String {
    flatten_output_payload(response, selectors).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn selectors(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_selectors() {
        let response = json!({"id": "x"});
        assert_eq!(flatten_output(&response, &[]), "{}");
    }

    #[test]
    fn test_wildcard() {
        let response = json!({"id": "x", "properties": {"a": 1}});
        assert_json_eq!(flatten_output_payload(&response, &selectors(&["*"])), response);
    }

    #[test]
    fn test_nested_selection() {
        let response = json!({
            "id": "x",
            "properties": {"provisioningState": "Succeeded", "addressSpace": {"prefixes": ["10.0.0.0/16"]}}
        });
        let out = flatten_output_payload(
            &response,
            &selectors(&["properties.addressSpace", "id", "properties.missing"]),
        );
        assert_json_eq!(
            out,
            json!({"id": "x", "properties": {"addressSpace": {"prefixes": ["10.0.0.0/16"]}}})
        );
    }

    #[test]
    fn test_array_selection() {
        let response = json!({"properties": {"subnets": [{"name": "a"}, {"name": "b"}]}});
        let out = flatten_output(&response, &selectors(&["properties.subnets"]));
        assert_eq!(out, r#"{"properties":{"subnets":[{"name":"a"},{"name":"b"}]}}"#);
    }
}
