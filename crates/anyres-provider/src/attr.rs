//! Tri-state attribute values.
//!
//! Configuration may reference values that are only known after another
//! resource has been applied. Such values are `Unknown` in configuration and
//! plans; persisted state only ever holds `Null` or `Known`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr<T> {
    Null,
    Unknown,
    Known(T),
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Null
    }
}

impl<T> Attr<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Attr::Known(_))
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Attr::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Attr<&T> {
        match self {
            Attr::Null => Attr::Null,
            Attr::Unknown => Attr::Unknown,
            Attr::Known(value) => Attr::Known(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attr<U> {
        match self {
            Attr::Null => Attr::Null,
            Attr::Unknown => Attr::Unknown,
            Attr::Known(value) => Attr::Known(f(value)),
        }
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Attr::Known(value),
            None => Attr::Null,
        }
    }
}

impl Attr<String> {
    /// The known text, or `""` for null and unknown values.
    pub fn value_str(&self) -> &str {
        self.known().map(String::as_str).unwrap_or_default()
    }
}

/// `Known(v)` serialises as `v` and `Null` as `null`; an `Unknown` value
/// cannot be persisted and fails serialisation.
impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Null => serializer.serialize_none(),
            Attr::Known(value) => serializer.serialize_some(value),
            Attr::Unknown => Err(serde::ser::Error::custom(
                "an unknown value cannot be persisted",
            )),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Attr::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_states() {
        let known: Attr<String> = Attr::Known("westeurope".into());
        assert!(known.is_known());
        assert_eq!(known.value_str(), "westeurope");
        assert_eq!(Attr::<String>::Unknown.value_str(), "");
        assert!(Attr::<String>::default().is_null());
        assert_eq!(Attr::from(Some(1)).map(|v| v + 1), Attr::Known(2));
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_value(Attr::Known(3)).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(Attr::<u8>::Null).unwrap(), json!(null));
        assert!(serde_json::to_value(Attr::<u8>::Unknown).is_err());

        let back: Attr<String> = serde_json::from_value(json!(null)).unwrap();
        assert!(back.is_null());
        let back: Attr<String> = serde_json::from_value(json!("x")).unwrap();
        assert_eq!(back, Attr::Known("x".to_string()));
    }
}
