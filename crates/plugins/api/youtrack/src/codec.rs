//! Conversion between YouTrack wire shapes and domain types.
//!
//! Pure functions only: the client decodes raw responses with serde and hands
//! them here, and builds request payloads from here before sending.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use trackbridge_core::{
    CustomField, CustomFieldOption, CustomFieldSchema, FieldValue, IssueComment, IssueCreated,
    IssueDetails, IssueSummary, IssueUpdateResult, ProjectDetails, ProjectRef, SavedSearch,
    TagRef, Timestamp, UserRef,
};

use crate::inference::{infer, FieldKind};
use crate::types::{
    CustomFieldPayload, ProjectPayload, YouTrackBundleValue, YouTrackColor, YouTrackComment,
    YouTrackCustomField, YouTrackFieldBlock, YouTrackIssue, YouTrackLinkResponse,
    YouTrackProject, YouTrackProjectDetails, YouTrackSavedSearch, YouTrackTag, YouTrackUser,
};

/// Keys tried, in order, when reducing a reference to a display value.
const DISPLAY_KEYS: [&str; 4] = ["name", "login", "fullName", "idReadable"];

// =============================================================================
// Scalars
// =============================================================================

/// Decode a timestamp.
///
/// Accepts epoch milliseconds as a number or a numeric string, and RFC 3339
/// strings. Anything else is `None`.
pub fn decode_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(millis) => DateTime::from_timestamp_millis(millis),
                Err(_) => DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
            }
        }
        _ => None,
    }
}

/// True for YouTrack entity ids such as `0-1` or `42-17`.
pub fn is_entity_id(value: &str) -> bool {
    static ENTITY_ID: OnceLock<Regex> = OnceLock::new();
    ENTITY_ID
        .get_or_init(|| Regex::new(r"^[0-9]+-[0-9]+$").expect("entity id pattern is valid"))
        .is_match(value)
}

fn color(color: Option<YouTrackColor>) -> Option<String> {
    color.and_then(|c| c.background)
}

// =============================================================================
// Custom field values
// =============================================================================

/// Reduce a custom field value for display.
///
/// A reference becomes its first present, non-null display key (`name`,
/// `login`, `fullName`, `idReadable`) and is kept whole when it has none.
/// Lists are reduced element-wise. Everything else passes through.
pub fn flatten(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Reference(mut map) => {
            for key in DISPLAY_KEYS {
                if map.get(key).is_some_and(|v| !v.is_null()) {
                    if let Some(found) = map.remove(key) {
                        return found;
                    }
                }
            }
            FieldValue::Reference(map)
        }
        FieldValue::List(items) => FieldValue::List(items.into_iter().map(flatten).collect()),
        other => other,
    }
}

/// Decode an issue's custom field list, skipping entries without a name.
pub fn decode_custom_fields(fields: Vec<YouTrackCustomField>) -> Vec<CustomField> {
    fields
        .into_iter()
        .filter_map(|field| {
            let name = field.name?;
            Some(CustomField {
                name,
                value: flatten(field.value),
            })
        })
        .collect()
}

/// Build the wire entry for one caller-supplied custom field.
pub fn encode_custom_field(field: &CustomField) -> CustomFieldPayload {
    let inferred = infer(field.value.clone());
    CustomFieldPayload {
        name: field.name.clone(),
        kind: inferred.kind,
        value: inferred.value,
    }
}

pub fn encode_custom_fields(fields: &[CustomField]) -> Vec<CustomFieldPayload> {
    fields.iter().map(encode_custom_field).collect()
}

/// State change entry. The tag is explicit, not inferred.
pub fn encode_state_field(field_name: &str, status: &str) -> CustomFieldPayload {
    CustomFieldPayload {
        name: field_name.to_string(),
        kind: Some(FieldKind::StateIssueCustomField),
        value: FieldValue::reference([("name", status)]),
    }
}

/// Assignee entry, `{"name": "Assignee", "value": {"login": ..}}`.
pub fn encode_assignee(login: &str) -> CustomFieldPayload {
    CustomFieldPayload {
        name: "Assignee".to_string(),
        kind: None,
        value: FieldValue::reference([("login", login)]),
    }
}

// =============================================================================
// Projects
// =============================================================================

/// Project reference for an id that needs no lookup.
pub fn project_by_id(id: &str) -> ProjectPayload {
    ProjectPayload {
        id: Some(id.to_string()),
        ..Default::default()
    }
}

/// Project reference built from a successful short-name lookup.
pub fn project_from_lookup(short_name: &str, found: &ProjectDetails) -> ProjectPayload {
    ProjectPayload {
        id: found.id.clone(),
        short_name: Some(
            found
                .short_name
                .clone()
                .unwrap_or_else(|| short_name.to_string()),
        ),
        name: found.name.clone(),
    }
}

/// Project reference used when the lookup failed.
pub fn project_by_short_name(short_name: &str) -> ProjectPayload {
    ProjectPayload {
        short_name: Some(short_name.to_string()),
        ..Default::default()
    }
}

// =============================================================================
// References
// =============================================================================

pub fn map_project(project: YouTrackProject) -> ProjectRef {
    ProjectRef {
        id: project.id,
        name: project.name,
        short_name: project.short_name,
    }
}

pub fn map_user(user: YouTrackUser) -> UserRef {
    UserRef {
        id: user.id,
        login: user.login,
        full_name: user.full_name,
        email: user.email,
        timezone: user.timezone.or(user.time_zone),
    }
}

pub fn map_tag(tag: YouTrackTag) -> TagRef {
    TagRef {
        id: tag.id,
        name: tag.name,
        color: color(tag.color),
    }
}

// =============================================================================
// Issues
// =============================================================================

pub fn map_issue_summary(issue: YouTrackIssue) -> IssueSummary {
    IssueSummary {
        id: issue.id,
        id_readable: issue.id_readable,
        summary: issue.summary,
        project: issue.project.map(map_project),
        reporter: issue.reporter.map(map_user),
        created: decode_timestamp(&issue.created),
        updated: decode_timestamp(&issue.updated),
        resolved: decode_timestamp(&issue.resolved),
    }
}

pub fn map_issue_details(issue: YouTrackIssue) -> IssueDetails {
    IssueDetails {
        id: issue.id,
        id_readable: issue.id_readable,
        summary: issue.summary,
        description: issue.description,
        project: issue.project.map(map_project),
        reporter: issue.reporter.map(map_user),
        tags: issue
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(map_tag)
            .collect(),
        votes: issue.votes,
        created: decode_timestamp(&issue.created),
        updated: decode_timestamp(&issue.updated),
        resolved: decode_timestamp(&issue.resolved),
        custom_fields: issue.custom_fields.map(decode_custom_fields),
        url: issue.url,
    }
}

pub fn map_issue_created(issue: YouTrackIssue) -> IssueCreated {
    IssueCreated {
        id: issue.id,
        id_readable: issue.id_readable,
        summary: issue.summary,
        url: issue.url,
    }
}

/// Update result; the id falls back to the one that was requested.
pub fn map_update_result(
    issue: YouTrackIssue,
    requested_id: &str,
    fields_updated: Vec<String>,
) -> IssueUpdateResult {
    IssueUpdateResult {
        id: issue.id.unwrap_or_else(|| requested_id.to_string()),
        id_readable: issue.id_readable,
        summary: issue.summary,
        fields_updated,
        url: issue.url,
    }
}

pub fn map_comment(comment: YouTrackComment) -> IssueComment {
    IssueComment {
        id: comment.id,
        author: comment.author.map(map_user),
        text: comment.text,
        created: decode_timestamp(&comment.created),
        updated: decode_timestamp(&comment.updated),
    }
}

pub fn map_saved_search(search: YouTrackSavedSearch) -> SavedSearch {
    SavedSearch {
        id: search.id,
        name: search.name,
        query: search.query,
        owner: search.owner.map(map_user),
    }
}

/// Link counts per link type name; `None` when the response lists none.
pub fn decode_link_counts(response: YouTrackLinkResponse) -> Option<BTreeMap<String, u32>> {
    let counts: BTreeMap<String, u32> = response
        .link_type_aggregated?
        .into_iter()
        .filter_map(|entry| Some((entry.name?, entry.issues?.size?)))
        .collect();
    if counts.is_empty() {
        None
    } else {
        Some(counts)
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Name and type id of a schema entry.
struct FieldIdentity {
    name: Option<String>,
    field_type: Option<String>,
}

/// Identity from the `field` sub-object.
fn nested_identity(block: &YouTrackFieldBlock) -> Option<FieldIdentity> {
    let field = block.field.as_ref()?;
    Some(FieldIdentity {
        name: field.name.clone(),
        field_type: field.field_type.as_ref().and_then(|t| t.id.clone()),
    })
}

/// Identity from keys at block level.
fn flat_identity(block: &YouTrackFieldBlock) -> FieldIdentity {
    FieldIdentity {
        name: block.name.clone(),
        field_type: block.field_type.as_ref().and_then(|t| t.id.clone()),
    }
}

fn map_option(value: YouTrackBundleValue) -> CustomFieldOption {
    CustomFieldOption {
        id: value.id,
        name: value.name,
        color: color(value.color),
    }
}

/// Decode one project custom field entry.
///
/// The entry is either wrapped as `{"projectCustomField": {..}}` or is the
/// block itself. Non-object entries yield `None`.
pub fn decode_field_schema(entry: &Value) -> Option<CustomFieldSchema> {
    let block = match entry.get("projectCustomField") {
        Some(inner @ Value::Object(_)) => inner,
        _ => entry,
    };
    if !block.is_object() {
        return None;
    }
    let block: YouTrackFieldBlock = serde_json::from_value(block.clone()).ok()?;

    let identity = nested_identity(&block).unwrap_or_else(|| flat_identity(&block));
    let required = match (block.is_required, block.can_be_empty) {
        (Some(required), _) => required,
        (None, Some(can_be_empty)) => !can_be_empty,
        (None, None) => false,
    };
    let default_value = match block.default_value {
        FieldValue::Null => None,
        other => Some(other),
    };

    Some(CustomFieldSchema {
        name: identity.name,
        field_type: identity.field_type,
        required,
        can_be_empty: block.can_be_empty.unwrap_or(!required),
        default_value,
        possible_values: block
            .bundle
            .and_then(|b| b.values)
            .unwrap_or_default()
            .into_iter()
            .map(map_option)
            .collect(),
    })
}

pub fn decode_field_schemas(entries: &[Value]) -> Vec<CustomFieldSchema> {
    entries.iter().filter_map(decode_field_schema).collect()
}

pub fn map_project_details(project: YouTrackProjectDetails) -> ProjectDetails {
    ProjectDetails {
        id: project.id,
        name: project.name,
        short_name: project.short_name,
        description: project.description,
        leader: project.leader.map(map_user),
        created: decode_timestamp(&project.created),
        custom_field_schemas: project
            .custom_fields
            .as_deref()
            .map(decode_field_schemas)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_forms_agree() {
        let expected = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000);
        assert!(expected.is_some());
        assert_eq!(decode_timestamp(&json!(1_700_000_000_000i64)), expected);
        assert_eq!(decode_timestamp(&json!("1700000000000")), expected);
        assert_eq!(decode_timestamp(&json!("2023-11-14T22:13:20Z")), expected);
    }

    #[test]
    fn test_timestamp_garbage_is_none() {
        assert_eq!(decode_timestamp(&json!("yesterday")), None);
        assert_eq!(decode_timestamp(&json!(null)), None);
        assert_eq!(decode_timestamp(&json!(true)), None);
        assert_eq!(decode_timestamp(&json!({"ms": 1})), None);
    }

    #[test]
    fn test_entity_id_pattern() {
        assert!(is_entity_id("0-1"));
        assert!(is_entity_id("42-17"));
        assert!(!is_entity_id("DEMO"));
        assert!(!is_entity_id("DEMO-42"));
        assert!(!is_entity_id("42-17-1"));
        assert!(!is_entity_id(""));
        // Only ASCII digits form an entity id
        assert!(!is_entity_id("٤٢-١٧"));
        assert!(!is_entity_id("４２-１７"));
    }

    #[test]
    fn test_flatten_reference_priority() {
        let value = FieldValue::from(json!({"login": "jdoe", "fullName": "John Doe"}));
        assert_eq!(flatten(value), FieldValue::from("jdoe"));

        let value = FieldValue::from(json!({"name": null, "fullName": "John Doe"}));
        assert_eq!(flatten(value), FieldValue::from("John Doe"));

        let value = FieldValue::from(json!({"presentation": "2h"}));
        assert_eq!(flatten(value.clone()), value);
    }

    #[test]
    fn test_flatten_list_keeps_order() {
        let value = FieldValue::from(json!([{"name": "Backend"}, {"name": "Frontend"}, 3]));
        assert_eq!(
            flatten(value),
            FieldValue::from(json!(["Backend", "Frontend", 3]))
        );
    }

    #[test]
    fn test_string_survives_encode_then_flatten() {
        let field = CustomField::new("Priority", "High");
        let encoded = encode_custom_field(&field);
        assert_eq!(encoded.kind, Some(FieldKind::SingleEnumIssueCustomField));
        assert_eq!(flatten(encoded.value), FieldValue::from("High"));
    }

    #[test]
    fn test_decode_custom_fields_skips_unnamed() {
        let fields: Vec<YouTrackCustomField> = serde_json::from_value(json!([
            {"name": "Priority", "value": {"name": "Major", "$type": "EnumBundleElement"}},
            {"value": {"name": "orphan"}},
            {"name": 7, "value": "bad name"},
            {"name": "Estimation", "value": null}
        ]))
        .unwrap();

        let decoded = decode_custom_fields(fields);
        assert_eq!(
            decoded,
            vec![
                CustomField::new("Priority", "Major"),
                CustomField::new("Estimation", FieldValue::Null),
            ]
        );
    }

    #[test]
    fn test_state_field_encoding() {
        let payload = encode_state_field("Stage", "In Progress");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "name": "Stage",
                "$type": "StateIssueCustomField",
                "value": {"name": "In Progress"}
            })
        );
    }

    #[test]
    fn test_map_issue_details() {
        let raw: YouTrackIssue = serde_json::from_value(json!({
            "id": "2-15",
            "idReadable": "DEMO-15",
            "summary": "Crash on start",
            "project": {"id": "0-1", "shortName": "DEMO"},
            "reporter": {"login": "jdoe", "timeZone": "Europe/Berlin"},
            "tags": [{"id": "6-1", "name": "urgent", "color": {"background": "#f00"}}],
            "votes": 3,
            "created": 1_700_000_000_000i64,
            "customFields": [
                {"name": "Assignee", "value": {"login": "asmith", "fullName": "Anna Smith"}},
                {"name": "Subsystems", "value": [{"name": "UI"}]}
            ]
        }))
        .unwrap();

        let issue = map_issue_details(raw);
        assert_eq!(issue.id_readable.as_deref(), Some("DEMO-15"));
        assert_eq!(
            issue.project.as_ref().and_then(|p| p.short_name.as_deref()),
            Some("DEMO")
        );
        assert_eq!(
            issue.reporter.as_ref().and_then(|u| u.timezone.as_deref()),
            Some("Europe/Berlin")
        );
        assert_eq!(issue.tags[0].color.as_deref(), Some("#f00"));
        assert_eq!(issue.votes, Some(3));
        assert!(issue.created.is_some());
        assert!(issue.updated.is_none());
        assert_eq!(
            issue.custom_field("Assignee"),
            Some(&FieldValue::from("asmith"))
        );
        assert_eq!(
            issue.custom_field("Subsystems"),
            Some(&FieldValue::from(vec!["UI"]))
        );
    }

    #[test]
    fn test_update_result_id_fallback() {
        let result = map_update_result(YouTrackIssue::default(), "DEMO-3", vec![]);
        assert_eq!(result.id, "DEMO-3");
    }

    #[test]
    fn test_link_counts() {
        let response: YouTrackLinkResponse = serde_json::from_value(json!({
            "linkTypeAggregated": [
                {"name": "Relates", "issues": {"size": 2}},
                {"name": "Depends", "issues": {}},
                {"issues": {"size": 1}}
            ]
        }))
        .unwrap();
        let counts = decode_link_counts(response).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["Relates"], 2);

        assert!(decode_link_counts(YouTrackLinkResponse::default()).is_none());
        let empty: YouTrackLinkResponse =
            serde_json::from_value(json!({"linkTypeAggregated": []})).unwrap();
        assert!(decode_link_counts(empty).is_none());
    }

    #[test]
    fn test_schema_wrapped_and_flat_agree() {
        let block = json!({
            "field": {"name": "Priority", "fieldType": {"id": "enum[1]"}},
            "canBeEmpty": false,
            "defaultValue": {"name": "Normal"},
            "bundle": {"values": [
                {"id": "1-1", "name": "Normal", "color": {"background": "#fff"}},
                {"id": "1-2", "name": "Critical"}
            ]}
        });
        let wrapped = json!({"projectCustomField": block.clone()});

        let from_wrapped = decode_field_schema(&wrapped).unwrap();
        let from_block = decode_field_schema(&block).unwrap();
        assert_eq!(from_wrapped, from_block);

        assert_eq!(from_block.name.as_deref(), Some("Priority"));
        assert_eq!(from_block.field_type.as_deref(), Some("enum[1]"));
        assert!(from_block.required);
        assert!(!from_block.can_be_empty);
        assert_eq!(
            from_block.default_value,
            Some(FieldValue::reference([("name", "Normal")]))
        );
        assert_eq!(from_block.possible_values.len(), 2);
        assert_eq!(from_block.possible_values[0].color.as_deref(), Some("#fff"));
    }

    #[test]
    fn test_schema_flat_identity() {
        let entry = json!({
            "name": "Due Date",
            "fieldType": {"id": "date"},
            "isRequired": false
        });
        let schema = decode_field_schema(&entry).unwrap();
        assert_eq!(schema.name.as_deref(), Some("Due Date"));
        assert_eq!(schema.field_type.as_deref(), Some("date"));
        assert!(!schema.required);
        assert!(schema.can_be_empty);
        assert!(schema.default_value.is_none());
        assert!(schema.possible_values.is_empty());
    }

    #[test]
    fn test_schema_required_defaults() {
        let schema = decode_field_schema(&json!({"field": {"name": "X"}})).unwrap();
        assert!(!schema.required);
        assert!(schema.can_be_empty);

        let schema = decode_field_schema(&json!({"isRequired": true, "canBeEmpty": true})).unwrap();
        assert!(schema.required);
        assert!(schema.can_be_empty);

        assert!(decode_field_schema(&json!("junk")).is_none());
    }

    #[test]
    fn test_project_payloads() {
        assert_eq!(
            serde_json::to_value(project_by_id("42-17")).unwrap(),
            json!({"id": "42-17"})
        );
        assert_eq!(
            serde_json::to_value(project_by_short_name("DEMO")).unwrap(),
            json!({"shortName": "DEMO"})
        );

        let found = ProjectDetails {
            id: Some("0-5".to_string()),
            name: Some("Demo project".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(project_from_lookup("DEMO", &found)).unwrap(),
            json!({"id": "0-5", "shortName": "DEMO", "name": "Demo project"})
        );
    }
}
