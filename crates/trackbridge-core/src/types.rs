//! Domain types shared by the tracker adapter and its callers.
//!
//! Every entity is a plain value built fresh from one response. Fields the
//! tracker omitted (or sent in an unexpected shape) are `None`, never a
//! placeholder default.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Timestamp type used throughout the domain model.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// References
// =============================================================================

/// Reference to a tracker project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
}

/// Reference to a tracker user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: Option<String>,
    pub login: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub timezone: Option<String>,
}

/// A tag attached to an issue. Identity is `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Background color, e.g. `#ff0000`
    pub color: Option<String>,
}

impl TagRef {
    /// Case-insensitive name comparison.
    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.to_lowercase() == name.to_lowercase())
    }
}

// =============================================================================
// Issues
// =============================================================================

/// Issue as returned by search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub id: Option<String>,
    /// Human-facing id, e.g. "DEMO-42"
    pub id_readable: Option<String>,
    pub summary: Option<String>,
    pub project: Option<ProjectRef>,
    pub reporter: Option<UserRef>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub resolved: Option<Timestamp>,
}

/// One custom field of an issue, or one caller-supplied field to write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: FieldValue,
}

impl CustomField {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Full issue details.
///
/// Custom field values are flattened: reference objects are reduced to their
/// display name or login.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetails {
    pub id: Option<String>,
    pub id_readable: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub project: Option<ProjectRef>,
    pub reporter: Option<UserRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    pub votes: Option<u32>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub resolved: Option<Timestamp>,
    /// `None` when the response carried no custom field list at all
    pub custom_fields: Option<Vec<CustomField>>,
    pub url: Option<String>,
}

impl IssueDetails {
    /// Flattened value of a custom field, looked up by exact name.
    pub fn custom_field(&self, name: &str) -> Option<&FieldValue> {
        self.custom_fields
            .as_ref()?
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }
}

/// Result of creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCreated {
    pub id: Option<String>,
    pub id_readable: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
}

/// Result of updating an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdateResult {
    pub id: String,
    pub id_readable: Option<String>,
    pub summary: Option<String>,
    /// Top-level payload keys that were sent
    pub fields_updated: Vec<String>,
    pub url: Option<String>,
}

/// Input for creating an issue.
#[derive(Debug, Clone, Default)]
pub struct CreateIssueInput {
    /// Project entity id ("0-1") or short name ("DEMO")
    pub project: String,
    pub summary: String,
    pub description: Option<String>,
    pub custom_fields: Vec<CustomField>,
    pub tags: Vec<String>,
    /// Login for the Assignee field
    pub assignee: Option<String>,
    pub draft: bool,
}

/// Input for updating an issue. `None` / empty means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct UpdateIssueInput {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub custom_fields: Vec<CustomField>,
    pub tags: Vec<String>,
}

impl UpdateIssueInput {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.description.is_none()
            && self.custom_fields.is_empty()
            && self.tags.is_empty()
    }
}

// =============================================================================
// Comments, searches, links, tags
// =============================================================================

/// Comment on an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: Option<String>,
    pub author: Option<UserRef>,
    pub text: Option<String>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
}

/// Saved issue search of the current user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub query: Option<String>,
    pub owner: Option<UserRef>,
}

/// Direction of an issue link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkDirection {
    #[default]
    Outward,
    Inward,
    Both,
}

impl LinkDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkDirection::Outward => "OUTWARD",
            LinkDirection::Inward => "INWARD",
            LinkDirection::Both => "BOTH",
        }
    }
}

impl std::str::FromStr for LinkDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OUTWARD" => Ok(LinkDirection::Outward),
            "INWARD" => Ok(LinkDirection::Inward),
            "BOTH" => Ok(LinkDirection::Both),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown link direction '{}'. Expected OUTWARD, INWARD or BOTH",
                other
            ))),
        }
    }
}

/// Result of linking two issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLinkResult {
    pub from_issue: String,
    pub to_issue: String,
    pub link_type: String,
    pub direction: LinkDirection,
    /// Number of linked issues per link type name
    pub link_counts: Option<BTreeMap<String, u32>>,
}

/// Tag mutation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagAction {
    Add,
    Remove,
}

/// Authoritative tag list after a tag mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageTagsResult {
    pub issue_id: String,
    pub tags: Vec<TagRef>,
}

// =============================================================================
// Projects and schema
// =============================================================================

/// Selectable value of an enum-like custom field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldOption {
    pub id: Option<String>,
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Declared custom field of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldSchema {
    pub name: Option<String>,
    /// Wire type id, e.g. "enum[1]", "user[1]", "state[1]"
    pub field_type: Option<String>,
    pub required: bool,
    pub can_be_empty: bool,
    pub default_value: Option<FieldValue>,
    pub possible_values: Vec<CustomFieldOption>,
}

/// Custom field declarations of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFieldsSchema {
    pub project_id: String,
    pub fields: Vec<CustomFieldSchema>,
}

/// Full project details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub id: Option<String>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub leader: Option<UserRef>,
    pub created: Option<Timestamp>,
    pub custom_field_schemas: Vec<CustomFieldSchema>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Explicit offset/limit pair sent with every list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Continuation offset for a page that returned `returned` items.
    ///
    /// A full page is taken as "there may be more". At an exact multiple of
    /// `limit` this costs one extra, empty fetch.
    pub fn next_offset(&self, returned: usize) -> Option<u32> {
        if returned == self.limit as usize {
            Some(self.offset.saturating_add(self.limit))
        } else {
            None
        }
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u32,
    pub limit: u32,
    /// Total count, when the tracker reported one
    pub total: Option<u32>,
    pub next_offset: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: Option<u32>) -> Self {
        let next_offset = request.next_offset(items.len());
        Self {
            items,
            offset: request.offset,
            limit: request.limit,
            total,
            next_offset,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            total: self.total,
            next_offset: self.next_offset,
        }
    }
}
