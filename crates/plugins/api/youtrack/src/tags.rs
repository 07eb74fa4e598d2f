//! Issue tag reconciliation.
//!
//! YouTrack has no "set tags" call: a tag is added by POSTing its name and
//! removed by DELETEing it by id. Removal therefore reads the current tags
//! first to find the id. Both paths re-read the tags afterwards so callers
//! always get the server's list.

use tracing::debug;
use trackbridge_core::{Error, ManageTagsResult, Result, TagAction, TagRef};

use crate::client::{YouTrackClient, TAG_FIELDS};
use crate::codec;
use crate::types::{NamePayload, YouTrackTag};

impl YouTrackClient {
    /// Current tags of an issue.
    pub async fn issue_tags(&self, issue_id: &str) -> Result<Vec<TagRef>> {
        let url = self.endpoint(&["api", "issues", issue_id, "tags"])?;
        let tags: Vec<YouTrackTag> = self
            .get_list("get issue tags", url, &[("fields", TAG_FIELDS)])
            .await?;
        Ok(tags.into_iter().map(codec::map_tag).collect())
    }

    /// Apply one tag change and return the resulting tag list.
    pub(crate) async fn reconcile_tag(
        &self,
        issue_id: &str,
        tag: &str,
        action: TagAction,
    ) -> Result<ManageTagsResult> {
        match action {
            TagAction::Add => self.add_tag(issue_id, tag).await?,
            TagAction::Remove => self.remove_tag(issue_id, tag).await?,
        }

        let tags = self.issue_tags(issue_id).await?;
        Ok(ManageTagsResult {
            issue_id: issue_id.to_string(),
            tags,
        })
    }

    async fn add_tag(&self, issue_id: &str, tag: &str) -> Result<()> {
        debug!(issue_id = issue_id, tag = tag, "Adding tag");
        let url = self.endpoint(&["api", "issues", issue_id, "tags"])?;
        self.post_discard(
            "add tag",
            url,
            &[("fields", TAG_FIELDS)],
            &NamePayload::new(tag),
        )
        .await
    }

    async fn remove_tag(&self, issue_id: &str, tag: &str) -> Result<()> {
        let current = self.issue_tags(issue_id).await?;
        let tag_id = current
            .into_iter()
            .find(|t| t.has_name(tag))
            .and_then(|t| t.id)
            .ok_or_else(|| Error::TagNotFound {
                issue_id: issue_id.to_string(),
                tag: tag.to_string(),
            })?;

        debug!(issue_id = issue_id, tag = tag, tag_id = %tag_id, "Removing tag");
        let url = self.endpoint(&["api", "issues", issue_id, "tags", &tag_id])?;
        self.delete("remove tag", url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use trackbridge_core::IssueTracker;

    fn create_client(server: &MockServer) -> YouTrackClient {
        YouTrackClient::new(server.base_url(), "perm:test-token").unwrap()
    }

    #[tokio::test]
    async fn test_add_tag_returns_refetched_list() {
        let server = MockServer::start();

        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/api/issues/DEMO-1/tags")
                .json_body(json!({"name": "urgent"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"id": "6-1", "name": "urgent"}));
        });
        let list = server.mock(|when, then| {
            when.method(GET)
                .path("/api/issues/DEMO-1/tags")
                .query_param("fields", TAG_FIELDS);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                {"id": "6-1", "name": "urgent", "color": {"background": "#f00"}},
                {"id": "6-2", "name": "backend"}
            ]));
        });

        let client = create_client(&server);
        let result = client
            .manage_issue_tags("DEMO-1", "urgent", TagAction::Add)
            .await
            .unwrap();

        add.assert();
        list.assert();
        assert_eq!(result.issue_id, "DEMO-1");
        assert_eq!(result.tags.len(), 2);
        assert_eq!(result.tags[0].color.as_deref(), Some("#f00"));
    }

    #[tokio::test]
    async fn test_add_tag_accepts_empty_response() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/api/issues/DEMO-1/tags");
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/issues/DEMO-1/tags");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        });

        let client = create_client(&server);
        let result = client
            .manage_issue_tags("DEMO-1", "urgent", TagAction::Add)
            .await
            .unwrap();
        assert!(result.tags.is_empty());
    }

    #[tokio::test]
    async fn test_remove_tag_matches_case_insensitively() {
        let server = MockServer::start();

        let list = server.mock(|when, then| {
            when.method(GET).path("/api/issues/DEMO-1/tags");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                {"id": "6-1", "name": "Urgent"},
                {"id": "6-2", "name": "backend"}
            ]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/issues/DEMO-1/tags/6-1");
            then.status(200);
        });

        let client = create_client(&server);
        let result = client
            .manage_issue_tags("DEMO-1", "URGENT", TagAction::Remove)
            .await
            .unwrap();

        delete.assert();
        // One read to find the id, one for the returned list
        list.assert_hits(2);
        assert_eq!(result.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_remove_missing_tag_never_deletes() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/api/issues/DEMO-1/tags");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{"id": "6-2", "name": "backend"}]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE);
            then.status(200);
        });

        let client = create_client(&server);
        let err = client
            .manage_issue_tags("DEMO-1", "urgent", TagAction::Remove)
            .await
            .unwrap_err();

        delete.assert_hits(0);
        match err {
            Error::TagNotFound { issue_id, tag } => {
                assert_eq!(issue_id, "DEMO-1");
                assert_eq!(tag, "urgent");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_tag_without_id_is_not_found() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/api/issues/DEMO-1/tags");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{"name": "urgent"}]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE);
            then.status(200);
        });

        let client = create_client(&server);
        let err = client
            .manage_issue_tags("DEMO-1", "urgent", TagAction::Remove)
            .await
            .unwrap_err();

        delete.assert_hits(0);
        assert!(matches!(err, Error::TagNotFound { .. }));
    }
}
