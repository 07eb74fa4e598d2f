//! Custom field type inference for the write path.
//!
//! YouTrack needs a `$type` tag on most custom field writes, but callers only
//! hand over a field name and a value. The tag is chosen from the value's
//! shape alone, without looking up the project schema.

use serde::Serialize;
use trackbridge_core::FieldValue;

/// Wire tag of a custom field write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    SingleEnumIssueCustomField,
    SingleUserIssueCustomField,
    MultiEnumIssueCustomField,
    StateIssueCustomField,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::SingleEnumIssueCustomField => "SingleEnumIssueCustomField",
            FieldKind::SingleUserIssueCustomField => "SingleUserIssueCustomField",
            FieldKind::MultiEnumIssueCustomField => "MultiEnumIssueCustomField",
            FieldKind::StateIssueCustomField => "StateIssueCustomField",
        }
    }
}

/// Normalized value plus the tag to send with it.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredField {
    pub value: FieldValue,
    pub kind: Option<FieldKind>,
}

/// Pick the wire shape for a caller-supplied value.
///
/// - text becomes `{"name": text}` as a single enum value
/// - references are kept; `login` marks a user, `name` or `id` an enum value
/// - lists are kept and always sent as multi-enum, even when empty
/// - null, numbers and booleans are sent untagged
pub fn infer(value: FieldValue) -> InferredField {
    match value {
        FieldValue::Null => InferredField {
            value: FieldValue::Null,
            kind: None,
        },
        FieldValue::Text(text) => InferredField {
            value: FieldValue::reference([("name", text)]),
            kind: Some(FieldKind::SingleEnumIssueCustomField),
        },
        FieldValue::Reference(map) => {
            let kind = if map.contains_key("login") {
                Some(FieldKind::SingleUserIssueCustomField)
            } else if map.contains_key("name") || map.contains_key("id") {
                Some(FieldKind::SingleEnumIssueCustomField)
            } else {
                None
            };
            InferredField {
                value: FieldValue::Reference(map),
                kind,
            }
        }
        FieldValue::List(items) => InferredField {
            value: FieldValue::List(items),
            kind: Some(FieldKind::MultiEnumIssueCustomField),
        },
        other @ (FieldValue::Number(_) | FieldValue::Bool(_)) => InferredField {
            value: other,
            kind: None,
        },
    }
}
