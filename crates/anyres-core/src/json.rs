//! Structural comparison, normalisation and selective overlay of JSON values.
//!
//! The backend is not a faithful mirror of what was sent: it may add fields,
//! reorder keys, change casing or drop properties it does not echo back. These
//! helpers let the engine decide whether something meaningfully changed without
//! relying on raw text equality.

use serde_json::{Map, Number, Value};

use crate::error::Result;
use crate::path::JsonPath;

/// Largest integer magnitude an `f64` represents exactly.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Options controlling [`update_object`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Match object keys and string values case-insensitively.
    pub ignore_casing: bool,
    /// Keep the requested value for properties the response does not report.
    pub ignore_missing_property: bool,
}

/// Canonicalises a JSON value: object keys sorted, integral floats written as integers.
pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::with_capacity(entries.len());
            for (key, item) in entries {
                out.insert(key.clone(), normalize_value(item));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        Value::Number(number) => Value::Number(normalize_number(number)),
        other => other.clone(),
    }
}

fn normalize_number(number: &Number) -> Number {
    if number.is_i64() || number.is_u64() {
        return number.clone();
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT => {
            if f < 0.0 {
                Number::from(f as i64)
            } else {
                Number::from(f as u64)
            }
        }
        _ => number.clone(),
    }
}

/// Normalises a JSON document given as text.
///
/// Text that is not valid JSON is returned unchanged, so two invalid inputs only
/// compare equal when they are byte-identical.
pub fn normalize_json(input: &str) -> String {
    match serde_json::from_str::<Value>(input) {
        Ok(value) => {
            serde_json::to_string(&normalize_value(&value)).unwrap_or_else(|_| input.to_string())
        }
        Err(_) => input.to_string(),
    }
}

/// Deep structural equality that ignores key order and numeric formatting.
pub fn semantically_equal(a: &Value, b: &Value) -> bool {
    normalize_value(a) == normalize_value(b)
}

/// Overlays `response` onto the shape of `request`.
///
/// Every property present in `request` takes the response's value at the same
/// path. Properties the response does not report (absent or `null`) are dropped,
/// unless `ignore_missing_property` is set, in which case the requested value is
/// kept. Arrays are matched element-wise; arrays of different length take the
/// response array as a whole.
pub fn update_object(request: &Value, response: &Value, options: UpdateOptions) -> Value {
    match (request, response) {
        (Value::Object(old), Value::Object(new)) => {
            let mut out = Map::new();
            for (key, old_value) in old {
                match lookup(new, key, options.ignore_casing) {
                    Some(new_value) => {
                        out.insert(key.clone(), update_object(old_value, new_value, options));
                    }
                    None if options.ignore_missing_property => {
                        out.insert(key.clone(), old_value.clone());
                    }
                    None => {}
                }
            }
            Value::Object(out)
        }
        (Value::Array(old), Value::Array(new)) => {
            if old.len() != new.len() {
                return response.clone();
            }
            Value::Array(
                old.iter()
                    .zip(new)
                    .map(|(o, n)| update_object(o, n, options))
                    .collect(),
            )
        }
        (Value::String(old), Value::String(new)) => {
            if options.ignore_casing && old.to_lowercase() == new.to_lowercase() {
                return request.clone();
            }
            if options.ignore_missing_property && is_masked(new) {
                return request.clone();
            }
            response.clone()
        }
        _ => response.clone(),
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str, ignore_casing: bool) -> Option<&'a Value> {
    let found = match map.get(key) {
        Some(value) => Some(value),
        None if ignore_casing => map
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value),
        None => None,
    };
    found.filter(|value| !value.is_null())
}

/// Secrets are echoed back blanked out or as a run of asterisks.
fn is_masked(value: &str) -> bool {
    value.is_empty() || value.chars().all(|c| c == '*')
}

/// For each path, replaces the value in `target` with the value found in `source`
/// (or removes it from `target` when `source` has nothing there).
pub fn override_with_paths(target: &Value, source: &Value, paths: &[String]) -> Result<Value> {
    let mut out = target.clone();
    for raw in paths {
        let path = JsonPath::parse(raw)?;
        match path.get(source) {
            Some(value) => path.set(&mut out, value.clone())?,
            None => path.remove(&mut out)?,
        }
    }
    Ok(out)
}
