//! YouTrack API client implementation.
//!
//! Every request carries an explicit `fields` selector; YouTrack returns only
//! `id` and `$type` for entities otherwise. List endpoints are paged with
//! `offset`/`limit`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use trackbridge_core::config::{DEFAULT_STATE_FIELD, DEFAULT_TIMEOUT_SECS};
use trackbridge_core::error::truncate_body;
use trackbridge_core::{
    CreateIssueInput, CustomField, Error, FieldValue, IssueComment, IssueCreated, IssueDetails,
    IssueFieldsSchema, IssueLinkResult, IssueSummary, IssueTracker, IssueUpdateResult,
    LinkDirection, ManageTagsResult, Page, PageRequest, ProjectDetails, ProjectRef, Result,
    SavedSearch, TagAction, UpdateIssueInput, UserRef, YouTrackConfig,
};

use crate::codec;
use crate::types::{
    CommentPayload, CreateIssuePayload, LinkPayload, LinkedIssuePayload, NamePayload,
    ProjectPayload, UpdateIssuePayload, YouTrackComment, YouTrackIssue, YouTrackLinkResponse,
    YouTrackProject, YouTrackProjectDetails, YouTrackSavedSearch, YouTrackUser,
};

const SEARCH_FIELDS: &str =
    "id,idReadable,summary,project(id,name,shortName),resolved,reporter(login,fullName,email),created,updated";

const ISSUE_FIELDS: &str = "id,idReadable,summary,description,project(id,name,shortName),\
reporter(login,fullName,email),tags(id,name,color(background)),votes,created,updated,resolved,url,\
customFields(name,value(name,login,fullName,idReadable,text,presentableName))";

const CREATE_FIELDS: &str = "id,idReadable,summary,project(id,name,shortName),url";

const UPDATE_FIELDS: &str = "id,idReadable,summary,updated,url";

const COMMENT_FIELDS: &str = "id,text,author(login,fullName,email),created,updated";

const SAVED_SEARCH_FIELDS: &str = "id,name,query,owner(login,fullName,email)";

pub(crate) const TAG_FIELDS: &str = "id,name,color(background)";

const LINK_FIELDS: &str =
    "linkType(name),direction,issues(idReadable),linkTypeAggregated(name,issues(size))";

const PROJECT_FIELDS: &str = "id,name,shortName";

const PROJECT_DETAILS_FIELDS: &str = "id,name,shortName,description,leader(login,fullName,email),created,\
customFields(projectCustomField(field(name,fieldType(id)),isRequired,canBeEmpty,emptyFieldText,defaultValue,\
bundle(values(id,name,color(background)))))";

const SCHEMA_FIELDS: &str = "projectCustomField(field(name,localizedName,fieldType(id)),canBeEmpty,\
emptyFieldText,isRequired,defaultValue,bundle(values(id,name,color(background))))";

const USER_FIELDS: &str = "id,login,fullName,email,timezone";

/// YouTrack REST API client.
pub struct YouTrackClient {
    base_url: Url,
    token: String,
    state_field: String,
    client: reqwest::Client,
}

impl YouTrackClient {
    /// Create a new client.
    ///
    /// Fails with [`Error::Config`] when the base URL is blank or is not an
    /// `http://`/`https://` URL. Trailing slashes are ignored.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::build(
            &base_url.into(),
            token.into(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a client from the `[youtrack]` config section.
    pub fn from_config(config: &YouTrackConfig) -> Result<Self> {
        let client = Self::build(
            &config.url,
            config.token.clone().unwrap_or_default(),
            Duration::from_secs(config.timeout_secs()),
        )?;
        Ok(client.with_state_field(config.state_field()))
    }

    /// Use a different custom field for status changes.
    pub fn with_state_field(mut self, name: impl Into<String>) -> Self {
        self.state_field = name.into();
        self
    }

    pub fn state_field(&self) -> &str {
        &self.state_field
    }

    fn build(base_url: &str, token: String, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::Config("YouTrack base URL is empty".to_string()));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(Error::Config(format!(
                "YouTrack base URL must start with http:// or https://, got '{}'",
                trimmed
            )));
        }
        let base_url = Url::parse(trimmed)
            .map_err(|e| Error::Config(format!("Invalid YouTrack base URL '{}': {}", trimmed, e)))?;

        let client = reqwest::Client::builder()
            .user_agent("trackbridge")
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            state_field: DEFAULT_STATE_FIELD.to_string(),
            client,
        })
    }

    /// Build an endpoint URL, percent-encoding each path segment.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build request with auth header.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if self.token.trim().is_empty() {
            builder
        } else {
            builder.header("Authorization", format!("Bearer {}", self.token))
        }
    }

    /// Send a request and turn non-2xx statuses into [`Error::Api`].
    async fn send(&self, action: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                action = action,
                status = status_code,
                message = %truncate_body(&message),
                "YouTrack API error response"
            );
            return Err(Error::api(action, status_code, &message));
        }

        Ok(response)
    }

    /// Decode a JSON body. Absent, non-JSON and mismatched bodies are
    /// [`Error::Decode`].
    async fn decode<T: DeserializeOwned>(&self, action: &str, response: Response) -> Result<T> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if body.trim().is_empty() {
            return Err(Error::decode(action, status, "empty response body", &body));
        }
        if !content_type.contains("json") {
            return Err(Error::decode(
                action,
                status,
                format!("unexpected content type '{}'", content_type),
                &body,
            ));
        }

        serde_json::from_str(&body).map_err(|e| Error::decode(action, status, e.to_string(), &body))
    }

    /// Decode a body that must be a single JSON object.
    ///
    /// Derived structs also accept a JSON array as a positional record,
    /// which would turn `[]` into an entity with every field absent.
    async fn decode_object<T: DeserializeOwned>(
        &self,
        action: &str,
        response: Response,
    ) -> Result<T> {
        let status = response.status().as_u16();
        let value: Value = self.decode(action, response).await?;
        if !value.is_object() {
            return Err(Error::decode(
                action,
                status,
                "expected a JSON object",
                &value.to_string(),
            ));
        }
        let body = value.to_string();
        serde_json::from_value(value).map_err(|e| Error::decode(action, status, e.to_string(), &body))
    }

    /// Make an authenticated GET request for a single entity.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        action: &str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!(url = url.as_str(), "YouTrack GET request");

        let response = self
            .send(action, self.request(Method::GET, url).query(query))
            .await?;
        self.decode_object(action, response).await
    }

    /// Make an authenticated GET request for an unpaged list.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        action: &str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        debug!(url = url.as_str(), "YouTrack GET request");

        let response = self
            .send(action, self.request(Method::GET, url).query(query))
            .await?;
        self.decode(action, response).await
    }

    /// Make an authenticated POST request and decode the response.
    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        action: &str,
        url: Url,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T> {
        debug!(url = url.as_str(), "YouTrack POST request");

        let response = self
            .send(action, self.request(Method::POST, url).query(query).json(body))
            .await?;
        self.decode_object(action, response).await
    }

    /// Make an authenticated POST request, ignoring the response body.
    pub(crate) async fn post_discard<B: Serialize>(
        &self,
        action: &str,
        url: Url,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<()> {
        debug!(url = url.as_str(), "YouTrack POST request");

        self.send(action, self.request(Method::POST, url).query(query).json(body))
            .await?;
        Ok(())
    }

    /// Make an authenticated DELETE request.
    pub(crate) async fn delete(&self, action: &str, url: Url) -> Result<()> {
        debug!(url = url.as_str(), "YouTrack DELETE request");

        self.send(action, self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Fetch one page of a list endpoint.
    ///
    /// `offset`, `limit` and `fields` are always sent. The total count comes
    /// from the `X-Total-Count` header when the server provides it.
    async fn list<R, T>(
        &self,
        action: &str,
        url: Url,
        extra: &[(&str, &str)],
        fields: &str,
        page: PageRequest,
        map: impl FnMut(R) -> T,
    ) -> Result<Page<T>>
    where
        R: DeserializeOwned,
    {
        let offset = page.offset.to_string();
        let limit = page.limit.to_string();
        let mut query: Vec<(&str, &str)> = extra.to_vec();
        query.push(("offset", &offset));
        query.push(("limit", &limit));
        query.push(("fields", fields));

        debug!(
            url = url.as_str(),
            offset = page.offset,
            limit = page.limit,
            "YouTrack GET list request"
        );

        let response = self
            .send(action, self.request(Method::GET, url).query(&query))
            .await?;
        let total = response
            .headers()
            .get("X-Total-Count")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());

        let items: Vec<R> = self.decode(action, response).await?;
        Ok(Page::new(items.into_iter().map(map).collect(), page, total))
    }

    /// Resolve the project reference for a create request.
    ///
    /// Entity ids are sent as-is. Short names are looked up; when the lookup
    /// fails for any reason the short name alone is sent.
    async fn resolve_project(&self, project: &str) -> ProjectPayload {
        if codec::is_entity_id(project) {
            return codec::project_by_id(project);
        }

        match self.get_project(project).await {
            Ok(found) => codec::project_from_lookup(project, &found),
            Err(e) => {
                warn!(
                    project = project,
                    error = %e,
                    "Project lookup failed, sending short name only"
                );
                codec::project_by_short_name(project)
            }
        }
    }

    /// POST a partial update and report which keys were sent.
    async fn post_update(
        &self,
        issue_id: &str,
        payload: &UpdateIssuePayload,
    ) -> Result<IssueUpdateResult> {
        let url = self.endpoint(&["api", "issues", issue_id])?;
        let issue: YouTrackIssue = self
            .post("update issue", url, &[("fields", UPDATE_FIELDS)], payload)
            .await?;
        Ok(codec::map_update_result(issue, issue_id, payload.keys()))
    }
}

#[async_trait]
impl IssueTracker for YouTrackClient {
    fn name(&self) -> &str {
        "youtrack"
    }

    async fn search_issues(&self, query: &str, page: PageRequest) -> Result<Page<IssueSummary>> {
        let url = self.endpoint(&["api", "issues"])?;
        self.list(
            "search issues",
            url,
            &[("query", query)],
            SEARCH_FIELDS,
            page,
            |issue: YouTrackIssue| codec::map_issue_summary(issue),
        )
        .await
    }

    async fn get_issue(&self, issue_id: &str) -> Result<IssueDetails> {
        let url = self.endpoint(&["api", "issues", issue_id])?;
        let issue: YouTrackIssue = self
            .get("get issue", url, &[("fields", ISSUE_FIELDS)])
            .await?;
        Ok(codec::map_issue_details(issue))
    }

    async fn create_issue(&self, input: &CreateIssueInput) -> Result<IssueCreated> {
        let project = self.resolve_project(&input.project).await;

        let mut custom_fields = codec::encode_custom_fields(&input.custom_fields);
        if let Some(login) = &input.assignee {
            custom_fields.push(codec::encode_assignee(login));
        }

        let payload = CreateIssuePayload {
            project,
            summary: input.summary.clone(),
            description: input.description.clone(),
            custom_fields,
            tags: input.tags.iter().map(NamePayload::new).collect(),
        };

        let mut query = Vec::new();
        if input.draft {
            query.push(("draft", "true"));
        }
        query.push(("fields", CREATE_FIELDS));

        let url = self.endpoint(&["api", "issues"])?;
        let issue: YouTrackIssue = self.post("create issue", url, &query, &payload).await?;
        Ok(codec::map_issue_created(issue))
    }

    async fn update_issue(
        &self,
        issue_id: &str,
        input: &UpdateIssueInput,
    ) -> Result<IssueUpdateResult> {
        let payload = UpdateIssuePayload {
            summary: input.summary.clone(),
            description: input.description.clone(),
            custom_fields: codec::encode_custom_fields(&input.custom_fields),
            tags: input.tags.iter().map(NamePayload::new).collect(),
        };
        self.post_update(issue_id, &payload).await
    }

    async fn change_assignee(&self, issue_id: &str, login: &str) -> Result<IssueUpdateResult> {
        let assignee = CustomField::new("Assignee", FieldValue::reference([("login", login)]));
        let payload = UpdateIssuePayload {
            custom_fields: codec::encode_custom_fields(&[assignee]),
            ..Default::default()
        };
        self.post_update(issue_id, &payload).await
    }

    async fn change_issue_status(
        &self,
        issue_id: &str,
        status: &str,
    ) -> Result<IssueUpdateResult> {
        let payload = UpdateIssuePayload {
            custom_fields: vec![codec::encode_state_field(&self.state_field, status)],
            ..Default::default()
        };
        self.post_update(issue_id, &payload).await
    }

    async fn add_comment(&self, issue_id: &str, text: &str) -> Result<IssueComment> {
        let url = self.endpoint(&["api", "issues", issue_id, "comments"])?;
        let payload = CommentPayload {
            text: text.to_string(),
        };
        let comment: YouTrackComment = self
            .post("add comment", url, &[("fields", COMMENT_FIELDS)], &payload)
            .await?;
        Ok(codec::map_comment(comment))
    }

    async fn get_comments(&self, issue_id: &str, page: PageRequest) -> Result<Page<IssueComment>> {
        let url = self.endpoint(&["api", "issues", issue_id, "comments"])?;
        self.list(
            "get comments",
            url,
            &[],
            COMMENT_FIELDS,
            page,
            |comment: YouTrackComment| codec::map_comment(comment),
        )
        .await
    }

    async fn manage_issue_tags(
        &self,
        issue_id: &str,
        tag: &str,
        action: TagAction,
    ) -> Result<ManageTagsResult> {
        self.reconcile_tag(issue_id, tag, action).await
    }

    async fn link_issues(
        &self,
        from_issue: &str,
        to_issue: &str,
        link_type: &str,
        direction: LinkDirection,
    ) -> Result<IssueLinkResult> {
        let url = self.endpoint(&["api", "issues", from_issue, "links"])?;
        let payload = LinkPayload {
            link_type: NamePayload::new(link_type),
            issues: vec![LinkedIssuePayload {
                id_readable: to_issue.to_string(),
            }],
            direction,
        };
        let response: YouTrackLinkResponse = self
            .post("link issues", url, &[("fields", LINK_FIELDS)], &payload)
            .await?;

        Ok(IssueLinkResult {
            from_issue: from_issue.to_string(),
            to_issue: to_issue.to_string(),
            link_type: link_type.to_string(),
            direction,
            link_counts: codec::decode_link_counts(response),
        })
    }

    async fn get_saved_searches(&self, page: PageRequest) -> Result<Page<SavedSearch>> {
        let url = self.endpoint(&["api", "user", "issueSearches"])?;
        self.list(
            "get saved searches",
            url,
            &[],
            SAVED_SEARCH_FIELDS,
            page,
            |search: YouTrackSavedSearch| codec::map_saved_search(search),
        )
        .await
    }

    async fn find_projects(&self, query: &str, page: PageRequest) -> Result<Page<ProjectRef>> {
        let url = self.endpoint(&["api", "admin", "projects"])?;
        self.list(
            "find projects",
            url,
            &[("query", query)],
            PROJECT_FIELDS,
            page,
            |project: YouTrackProject| codec::map_project(project),
        )
        .await
    }

    async fn get_project(&self, project_id: &str) -> Result<ProjectDetails> {
        let url = self.endpoint(&["api", "admin", "projects", project_id])?;
        let project: YouTrackProjectDetails = self
            .get("get project", url, &[("fields", PROJECT_DETAILS_FIELDS)])
            .await?;
        Ok(codec::map_project_details(project))
    }

    async fn get_issue_fields_schema(&self, project_id: &str) -> Result<IssueFieldsSchema> {
        let url = self.endpoint(&["api", "admin", "projects", project_id, "customFields"])?;
        let entries: Vec<Value> = self
            .get_list("get issue fields schema", url, &[("fields", SCHEMA_FIELDS)])
            .await?;
        Ok(IssueFieldsSchema {
            project_id: project_id.to_string(),
            fields: codec::decode_field_schemas(&entries),
        })
    }

    async fn find_users(&self, query: &str, page: PageRequest) -> Result<Page<UserRef>> {
        let url = self.endpoint(&["api", "users"])?;
        self.list(
            "find users",
            url,
            &[("query", query)],
            USER_FIELDS,
            page,
            |user: YouTrackUser| codec::map_user(user),
        )
        .await
    }

    async fn get_current_user(&self) -> Result<UserRef> {
        let url = self.endpoint(&["api", "users", "me"])?;
        let user: YouTrackUser = self
            .get("get current user", url, &[("fields", USER_FIELDS)])
            .await?;
        Ok(codec::map_user(user))
    }
}

// =============================================================================
// Tests
// =============================================================================
