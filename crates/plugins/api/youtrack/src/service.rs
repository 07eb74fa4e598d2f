//! Caller-facing facade over an [`IssueTracker`].
//!
//! Callers pass loose pagination values (possibly negative, zero, huge or
//! missing). The facade clamps them and rejects blank identifiers before any
//! request is made, then delegates.

use std::sync::Arc;

use tracing::{debug, info};
use trackbridge_core::{
    CreateIssueInput, Error, IssueComment, IssueCreated, IssueDetails, IssueFieldsSchema,
    IssueLinkResult, IssueSummary, IssueTracker, IssueUpdateResult, LinkDirection,
    ManageTagsResult, Page, PageRequest, ProjectDetails, ProjectRef, Result, SavedSearch,
    TagAction, UpdateIssueInput, UserRef,
};

/// Offset used when the caller gives none.
pub const DEFAULT_OFFSET: i64 = 0;
/// Page size used when the caller gives none.
pub const DEFAULT_LIMIT: i64 = 20;
/// Largest page size ever requested.
pub const MAX_LIMIT: i64 = 200;

/// Clamp caller pagination to `offset >= 0` and `1 <= limit <= 200`.
pub fn page_request(offset: Option<i64>, limit: Option<i64>) -> PageRequest {
    let offset = offset.unwrap_or(DEFAULT_OFFSET).clamp(0, u32::MAX as i64);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    PageRequest::new(offset as u32, limit as u32)
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be blank", what)));
    }
    Ok(())
}

/// Facade over any tracker backend.
pub struct YouTrackService<T: IssueTracker> {
    tracker: Arc<T>,
}

impl<T: IssueTracker> Clone for YouTrackService<T> {
    fn clone(&self) -> Self {
        Self {
            tracker: Arc::clone(&self.tracker),
        }
    }
}

impl<T: IssueTracker> YouTrackService<T> {
    pub fn new(tracker: T) -> Self {
        Self {
            tracker: Arc::new(tracker),
        }
    }

    pub fn from_arc(tracker: Arc<T>) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &Arc<T> {
        &self.tracker
    }

    /// Search issues. A blank query matches everything.
    pub async fn search_issues(
        &self,
        query: &str,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<IssueSummary>> {
        let page = page_request(offset, limit);
        debug!(
            query = query,
            offset = page.offset,
            limit = page.limit,
            "Searching issues"
        );
        self.tracker.search_issues(query, page).await
    }

    pub async fn get_issue(&self, issue_id: &str) -> Result<IssueDetails> {
        require(issue_id, "issue id")?;
        self.tracker.get_issue(issue_id).await
    }

    pub async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueCreated> {
        require(&input.project, "project")?;
        require(&input.summary, "summary")?;
        info!(project = %input.project, "Creating issue");
        self.tracker.create_issue(input).await
    }

    pub async fn update_issue(
        &self,
        issue_id: &str,
        input: &UpdateIssueInput,
    ) -> Result<IssueUpdateResult> {
        require(issue_id, "issue id")?;
        if input.is_empty() {
            return Err(Error::InvalidInput(
                "update must change at least one field".to_string(),
            ));
        }
        self.tracker.update_issue(issue_id, input).await
    }

    pub async fn change_assignee(&self, issue_id: &str, login: &str) -> Result<IssueUpdateResult> {
        require(issue_id, "issue id")?;
        require(login, "assignee")?;
        self.tracker.change_assignee(issue_id, login).await
    }

    pub async fn change_issue_status(
        &self,
        issue_id: &str,
        status: &str,
    ) -> Result<IssueUpdateResult> {
        require(issue_id, "issue id")?;
        require(status, "status")?;
        self.tracker.change_issue_status(issue_id, status).await
    }

    pub async fn add_comment(&self, issue_id: &str, text: &str) -> Result<IssueComment> {
        require(issue_id, "issue id")?;
        require(text, "comment text")?;
        info!(issue_id = issue_id, "Adding comment");
        self.tracker.add_comment(issue_id, text).await
    }

    pub async fn get_comments(
        &self,
        issue_id: &str,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<IssueComment>> {
        require(issue_id, "issue id")?;
        self.tracker
            .get_comments(issue_id, page_request(offset, limit))
            .await
    }

    pub async fn manage_issue_tags(
        &self,
        issue_id: &str,
        tag: &str,
        action: TagAction,
    ) -> Result<ManageTagsResult> {
        require(issue_id, "issue id")?;
        require(tag, "tag")?;
        self.tracker.manage_issue_tags(issue_id, tag, action).await
    }

    pub async fn link_issues(
        &self,
        from_issue: &str,
        to_issue: &str,
        link_type: &str,
        direction: LinkDirection,
    ) -> Result<IssueLinkResult> {
        require(from_issue, "source issue id")?;
        require(to_issue, "target issue id")?;
        require(link_type, "link type")?;
        self.tracker
            .link_issues(from_issue, to_issue, link_type, direction)
            .await
    }

    pub async fn get_saved_searches(
        &self,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<SavedSearch>> {
        self.tracker
            .get_saved_searches(page_request(offset, limit))
            .await
    }

    pub async fn find_projects(
        &self,
        query: &str,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<ProjectRef>> {
        self.tracker
            .find_projects(query, page_request(offset, limit))
            .await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<ProjectDetails> {
        require(project_id, "project")?;
        self.tracker.get_project(project_id).await
    }

    pub async fn get_issue_fields_schema(&self, project_id: &str) -> Result<IssueFieldsSchema> {
        require(project_id, "project")?;
        self.tracker.get_issue_fields_schema(project_id).await
    }

    pub async fn find_users(
        &self,
        query: &str,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<UserRef>> {
        self.tracker
            .find_users(query, page_request(offset, limit))
            .await
    }

    pub async fn get_current_user(&self) -> Result<UserRef> {
        self.tracker.get_current_user().await
    }
}
