//! YouTrack API wire types.
//!
//! Response types mirror the raw JSON returned by the YouTrack REST API. The
//! API is loosely typed: any key may be missing or carry an unexpected JSON
//! type, so every field goes through [`lenient`] and decodes to `None` instead
//! of failing the whole response. Timestamps are kept as raw JSON and decoded
//! by the codec.
//!
//! Request payloads are the exact bodies sent on the write path.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use trackbridge_core::{FieldValue, LinkDirection};

use crate::inference::FieldKind;

/// Decode a field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Decode a list field element-wise, dropping elements of the wrong shape.
///
/// `None` when the key is absent or not an array.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

// =============================================================================
// References
// =============================================================================

/// Project reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackProject {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub short_name: Option<String>,
}

/// User reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackUser {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub login: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,
    /// Requested as `timezone`
    #[serde(default, deserialize_with = "lenient")]
    pub timezone: Option<String>,
    /// Spelling used by some server versions
    #[serde(default, rename = "timeZone", deserialize_with = "lenient")]
    pub time_zone: Option<String>,
}

/// Color block, e.g. `{"background": "#ff0000"}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackColor {
    #[serde(default, deserialize_with = "lenient")]
    pub background: Option<String>,
}

/// Issue tag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackTag {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub color: Option<YouTrackColor>,
}

// =============================================================================
// Issues
// =============================================================================

/// One `{name, value}` entry of an issue's `customFields` list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackCustomField {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: FieldValue,
}

/// Issue as returned by search and detail endpoints.
///
/// Search requests a narrower `fields` selector, so detail-only keys are
/// simply absent there.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackIssue {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub id_readable: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub project: Option<YouTrackProject>,
    #[serde(default, deserialize_with = "lenient")]
    pub reporter: Option<YouTrackUser>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tags: Option<Vec<YouTrackTag>>,
    #[serde(default, deserialize_with = "lenient")]
    pub votes: Option<u32>,
    #[serde(default)]
    pub created: Value,
    #[serde(default)]
    pub updated: Value,
    #[serde(default)]
    pub resolved: Value,
    #[serde(default, deserialize_with = "lenient_list")]
    pub custom_fields: Option<Vec<YouTrackCustomField>>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

/// Issue comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackComment {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<YouTrackUser>,
    #[serde(default)]
    pub created: Value,
    #[serde(default)]
    pub updated: Value,
}

/// Saved search of the current user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackSavedSearch {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub owner: Option<YouTrackUser>,
}

// =============================================================================
// Links
// =============================================================================

/// `issues(size)` block of an aggregated link type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackLinkedIssues {
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<u32>,
}

/// Link count per link type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackLinkAggregate {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub issues: Option<YouTrackLinkedIssues>,
}

/// Response of `POST /api/issues/{id}/links`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackLinkResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub link_type_aggregated: Option<Vec<YouTrackLinkAggregate>>,
}

// =============================================================================
// Projects and schema
// =============================================================================

/// `fieldType` block, e.g. `{"id": "enum[1]"}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackFieldType {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
}

/// Field identity when nested under a `field` sub-object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackFieldIdentity {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub field_type: Option<YouTrackFieldType>,
}

/// Selectable bundle element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackBundleValue {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub color: Option<YouTrackColor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTrackBundle {
    #[serde(default, deserialize_with = "lenient_list")]
    pub values: Option<Vec<YouTrackBundleValue>>,
}

/// Project custom field block.
///
/// The identity is either nested under `field` or sits at block level, with
/// `name` and `fieldType` next to the settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackFieldBlock {
    #[serde(default, deserialize_with = "lenient")]
    pub field: Option<YouTrackFieldIdentity>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub field_type: Option<YouTrackFieldType>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_required: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub can_be_empty: Option<bool>,
    #[serde(default)]
    pub default_value: FieldValue,
    #[serde(default, deserialize_with = "lenient")]
    pub bundle: Option<YouTrackBundle>,
}

/// Full project as returned by `GET /api/admin/projects/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTrackProjectDetails {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub leader: Option<YouTrackUser>,
    #[serde(default)]
    pub created: Value,
    /// Schema entries, decoded by the codec
    #[serde(default, deserialize_with = "lenient_list")]
    pub custom_fields: Option<Vec<Value>>,
}

// =============================================================================
// Request payloads
// =============================================================================

/// Name reference, used for tags and link types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamePayload {
    pub name: String,
}

impl NamePayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Project reference sent when creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One custom field write: `{"name", "$type"?, "value"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomFieldPayload {
    pub name: String,
    #[serde(rename = "$type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    pub value: FieldValue,
}

/// Request body for creating an issue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssuePayload {
    pub project: ProjectPayload,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NamePayload>,
}

/// Partial update body. Absent keys are left unchanged by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssuePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldPayload>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NamePayload>,
}

impl UpdateIssuePayload {
    /// Top-level keys present in the serialized body, in wire order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if self.summary.is_some() {
            keys.push("summary".to_string());
        }
        if self.description.is_some() {
            keys.push("description".to_string());
        }
        if !self.custom_fields.is_empty() {
            keys.push("customFields".to_string());
        }
        if !self.tags.is_empty() {
            keys.push("tags".to_string());
        }
        keys
    }
}

/// Request body for adding a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentPayload {
    pub text: String,
}

/// Target of an issue link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedIssuePayload {
    pub id_readable: String,
}

/// Request body for linking two issues.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    pub link_type: NamePayload,
    pub issues: Vec<LinkedIssuePayload>,
    pub direction: LinkDirection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrong_types_decode_to_none() {
        let issue: YouTrackIssue = serde_json::from_value(json!({
            "id": 17,
            "idReadable": "DEMO-1",
            "summary": ["not", "a", "string"],
            "project": "DEMO",
            "votes": "many",
            "tags": [{"id": "6-1", "name": "urgent"}, "junk", {"name": 5}]
        }))
        .unwrap();

        assert!(issue.id.is_none());
        assert_eq!(issue.id_readable.as_deref(), Some("DEMO-1"));
        assert!(issue.summary.is_none());
        assert!(issue.project.is_none());
        assert!(issue.votes.is_none());

        let tags = issue.tags.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name.as_deref(), Some("urgent"));
        assert!(tags[1].name.is_none());
    }

    #[test]
    fn test_null_and_missing_keys() {
        let issue: YouTrackIssue = serde_json::from_value(json!({
            "idReadable": null,
            "customFields": null
        }))
        .unwrap();
        assert!(issue.id_readable.is_none());
        assert!(issue.custom_fields.is_none());
        assert!(issue.created.is_null());
    }

    #[test]
    fn test_update_payload_keys_follow_body() {
        let payload = UpdateIssuePayload {
            description: Some("text".to_string()),
            tags: vec![NamePayload::new("urgent")],
            ..Default::default()
        };
        assert_eq!(payload.keys(), vec!["description", "tags"]);

        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body,
            json!({"description": "text", "tags": [{"name": "urgent"}]})
        );
    }

    #[test]
    fn test_custom_field_payload_omits_missing_type() {
        let payload = CustomFieldPayload {
            name: "Estimate".to_string(),
            kind: None,
            value: FieldValue::from(3i64),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"name": "Estimate", "value": 3})
        );
    }

    #[test]
    fn test_link_payload_shape() {
        let payload = LinkPayload {
            link_type: NamePayload::new("Relates"),
            issues: vec![LinkedIssuePayload {
                id_readable: "DEMO-2".to_string(),
            }],
            direction: LinkDirection::Outward,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "linkType": {"name": "Relates"},
                "issues": [{"idReadable": "DEMO-2"}],
                "direction": "OUTWARD"
            })
        );
    }
}
