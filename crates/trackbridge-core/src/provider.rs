//! Issue tracker trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CreateIssueInput, IssueComment, IssueCreated, IssueDetails, IssueFieldsSchema,
    IssueLinkResult, IssueSummary, IssueUpdateResult, LinkDirection, ManageTagsResult, Page,
    PageRequest, ProjectDetails, ProjectRef, SavedSearch, TagAction, UpdateIssueInput, UserRef,
};

/// Operations of an issue tracker backend.
///
/// Paginated operations take an explicit [`PageRequest`]; bounds are the
/// caller's concern. Query strings may be empty, meaning "everything".
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Get the tracker name (e.g., "youtrack")
    fn name(&self) -> &str;

    async fn search_issues(&self, query: &str, page: PageRequest) -> Result<Page<IssueSummary>>;

    async fn get_issue(&self, issue_id: &str) -> Result<IssueDetails>;

    async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueCreated>;

    /// Partial update: only the fields set on `input` are sent.
    async fn update_issue(
        &self,
        issue_id: &str,
        input: &UpdateIssueInput,
    ) -> Result<IssueUpdateResult>;

    async fn change_assignee(&self, issue_id: &str, login: &str) -> Result<IssueUpdateResult>;

    async fn change_issue_status(&self, issue_id: &str, status: &str)
        -> Result<IssueUpdateResult>;

    async fn add_comment(&self, issue_id: &str, text: &str) -> Result<IssueComment>;

    async fn get_comments(&self, issue_id: &str, page: PageRequest) -> Result<Page<IssueComment>>;

    /// Add or remove one tag, returning the tag list after the change.
    async fn manage_issue_tags(
        &self,
        issue_id: &str,
        tag: &str,
        action: TagAction,
    ) -> Result<ManageTagsResult>;

    async fn link_issues(
        &self,
        from_issue: &str,
        to_issue: &str,
        link_type: &str,
        direction: LinkDirection,
    ) -> Result<IssueLinkResult>;

    async fn get_saved_searches(&self, page: PageRequest) -> Result<Page<SavedSearch>>;

    async fn find_projects(&self, query: &str, page: PageRequest) -> Result<Page<ProjectRef>>;

    async fn get_project(&self, project_id: &str) -> Result<ProjectDetails>;

    async fn get_issue_fields_schema(&self, project_id: &str) -> Result<IssueFieldsSchema>;

    async fn find_users(&self, query: &str, page: PageRequest) -> Result<Page<UserRef>>;

    async fn get_current_user(&self) -> Result<UserRef>;
}
