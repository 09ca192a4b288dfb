//! Dotted path expressions over JSON values.
//!
//! A path is a sequence of segments separated by `.`, e.g. `properties.subnets.0.name`.
//! Numeric segments index into arrays and are treated as plain keys on objects.
//! A literal dot inside a key is written as `\.` (`tags.hidden-link\.owner`).

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// A parsed JSON path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    segments: Vec<String>,
}

impl JsonPath {
    /// Parses a dotted path expression.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(CoreError::invalid_path(raw, "path must not be empty"));
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'.') => {
                    current.push('.');
                    chars.next();
                }
                '.' => {
                    if current.is_empty() {
                        return Err(CoreError::invalid_path(raw, "empty path segment"));
                    }
                    segments.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }
        if current.is_empty() {
            return Err(CoreError::invalid_path(raw, "empty path segment"));
        }
        segments.push(current);

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Looks up the value at this path. Missing keys, out-of-range indexes and
    /// scalars in the middle of the path all resolve to `None`.
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `new_value` at this path, creating intermediate objects as needed.
    ///
    /// Fails when a segment has to descend into a scalar, when a non-numeric
    /// segment addresses an array, or when an index lies beyond the end of an
    /// array (an index equal to the length appends).
    pub fn set(&self, target: &mut Value, new_value: Value) -> Result<()> {
        let (last, parents) = self
            .segments
            .split_last()
            .ok_or_else(|| CoreError::invalid_path(&self.raw, "path must not be empty"))?;

        let mut current = target;
        for (depth, segment) in parents.iter().enumerate() {
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(map) => map
                    .entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                Value::Array(items) => {
                    let index = self.index_for(segment, depth, items.len())?;
                    if index == items.len() {
                        items.push(Value::Object(Map::new()));
                    }
                    &mut items[index]
                }
                other => return Err(self.shape_error(depth, other)),
            };
        }

        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => {
                map.insert(last.clone(), new_value);
            }
            Value::Array(items) => {
                let index = self.index_for(last, parents.len(), items.len())?;
                if index == items.len() {
                    items.push(new_value);
                } else {
                    items[index] = new_value;
                }
            }
            other => return Err(self.shape_error(parents.len(), other)),
        }
        Ok(())
    }

    /// Removes the value at this path. Removing something that is not there is
    /// not an error, descending into a scalar is.
    pub fn remove(&self, target: &mut Value) -> Result<()> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Ok(());
        };

        let mut current = target;
        for (depth, segment) in parents.iter().enumerate() {
            current = match current {
                Value::Object(map) => match map.get_mut(segment) {
                    Some(next) => next,
                    None => return Ok(()),
                },
                Value::Array(items) => {
                    let len = items.len();
                    let index = self.index_for(segment, depth, len)?;
                    match items.get_mut(index) {
                        Some(next) => next,
                        None => return Ok(()),
                    }
                }
                Value::Null => return Ok(()),
                other => return Err(self.shape_error(depth, other)),
            };
        }

        match current {
            Value::Object(map) => {
                map.remove(last);
            }
            Value::Array(items) => {
                let index = self.index_for(last, parents.len(), items.len())?;
                if index < items.len() {
                    items.remove(index);
                }
            }
            Value::Null => {}
            other => return Err(self.shape_error(parents.len(), other)),
        }
        Ok(())
    }

    fn index_for(&self, segment: &str, depth: usize, len: usize) -> Result<usize> {
        let index = segment.parse::<usize>().map_err(|_| {
            CoreError::invalid_path(
                &self.raw,
                format!(
                    "segment {segment:?} at {:?} addresses an array and must be an index",
                    self.prefix(depth)
                ),
            )
        })?;
        if index > len {
            return Err(CoreError::invalid_path(
                &self.raw,
                format!(
                    "index {index} out of range at {:?} (length {len})",
                    self.prefix(depth)
                ),
            ));
        }
        Ok(index)
    }

    fn shape_error(&self, depth: usize, found: &Value) -> CoreError {
        CoreError::invalid_path(
            &self.raw,
            format!(
                "expected an object or array at {:?}, found {}",
                self.prefix(depth),
                kind_of(found)
            ),
        )
    }

    fn prefix(&self, depth: usize) -> String {
        if depth == 0 {
            return "$".to_string();
        }
        self.segments[..depth].join(".")
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Human readable name of a JSON value's shape, used in error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
