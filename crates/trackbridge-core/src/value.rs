//! Closed value union for dynamically-typed custom field payloads.
//!
//! Tracker custom fields carry values whose shape is only known at runtime:
//! a plain string, a reference object (`{"name": "High"}`, `{"login": "jdoe"}`),
//! a list of references, a number or a boolean. [`FieldValue`] captures every
//! shape the adapter understands so that inference and flattening can match on
//! it exhaustively instead of probing untyped JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// A custom field value, parsed from or rendered to JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Key/value object, e.g. an enum bundle element or a user
    Reference(BTreeMap<String, FieldValue>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Build a reference object from key/value pairs.
    pub fn reference<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        FieldValue::Reference(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key of a reference object. `None` for every other shape.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Reference(map) => map.get(key),
            _ => None,
        }
    }

    /// Render back to untyped JSON.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Reference(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(map) => FieldValue::Reference(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => n.serialize(serializer),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Reference(map) => map.serialize(serializer),
            FieldValue::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FieldValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_every_shape() {
        assert_eq!(FieldValue::from(json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from(json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(json!(3)), FieldValue::from(3i64));
        assert_eq!(FieldValue::from(json!("High")), FieldValue::from("High"));
        assert_eq!(
            FieldValue::from(json!({"name": "High"})),
            FieldValue::reference([("name", "High")])
        );
        assert_eq!(
            FieldValue::from(json!(["a", {"name": "b"}])),
            FieldValue::List(vec![
                FieldValue::from("a"),
                FieldValue::reference([("name", "b")])
            ])
        );
    }

    #[test]
    fn test_to_json_matches_source() {
        let source = json!({
            "name": "Assignee",
            "value": [{"login": "jdoe", "ringId": null}, 4.5, false]
        });
        assert_eq!(FieldValue::from(source.clone()).to_json(), source);
    }

    #[test]
    fn test_serde_is_transparent() {
        let value = FieldValue::reference([("login", "jdoe")]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"login":"jdoe"}"#
        );

        let parsed: FieldValue = serde_json::from_str(r#"[1, "x", null]"#).unwrap();
        assert_eq!(
            parsed,
            FieldValue::List(vec![
                FieldValue::from(1i64),
                FieldValue::from("x"),
                FieldValue::Null
            ])
        );
    }

    #[test]
    fn test_reference_lookup() {
        let value = FieldValue::reference([("name", "Open")]);
        assert_eq!(value.get("name").and_then(FieldValue::as_text), Some("Open"));
        assert!(value.get("login").is_none());
        assert!(FieldValue::from("Open").get("name").is_none());
    }
}
