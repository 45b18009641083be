//! GitLab provider (REST v4) for branches, merge requests, diffs and notes.
//!
//! Endpoints used:
//!   * GET  /projects/:id/repository/branches/:branch
//!   * POST /projects/:id/repository/branches
//!   * POST /projects/:id/repository/commits
//!   * POST /projects/:id/merge_requests
//!   * GET  /projects/:id/merge_requests/:iid/changes
//!   * POST /projects/:id/merge_requests/:iid/notes
//!   * PUT  /projects/:id/merge_requests/:iid (labels, reviewers)
//!   * GET  /users?username=:name
//!
//! Success is HTTP 200 or 201. Every other status is an error unless a call
//! documents a special case.

use crate::errors::{PlatformError, PlatformResult};
use crate::git_providers::types::*;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Body marker GitLab uses when the branch to create is already there.
const BRANCH_EXISTS_MARKER: &str = "Branch already exists";

/// GitLab HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_api: String, // e.g. "https://gitlab.com/api/v4"
    token: String,    // "PRIVATE-TOKEN"
}

impl GitLabClient {
    /// Constructs a GitLab client with a shared HTTP instance and auth token.
    pub fn new(http: Client, base_api: String, token: String) -> Self {
        debug!("Creating GitLabClient with base_api={}", base_api);
        Self {
            http,
            base_api,
            token,
        }
    }

    /// Looks a branch up by name.
    ///
    /// Returns `Ok(None)` on 404; that is a valid negative answer, not a failure.
    pub async fn find_branch(
        &self,
        project_id: u64,
        branch: &str,
    ) -> PlatformResult<Option<Branch>> {
        let url = format!(
            "{}/projects/{}/repository/branches/{}",
            self.base_api,
            project_id,
            urlencoding::encode(branch)
        );
        debug!("GitLab find_branch: {}", url);

        let resp = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(branch, "GitLab branch not found");
            return Ok(None);
        }

        let body = success_body(resp).await?;
        let raw: GitLabBranch = serde_json::from_str(&body)?;
        Ok(Some(raw.into_branch()))
    }

    /// Creates `branch` from `git_ref`.
    ///
    /// A rejection whose body says the branch already exists is reported as
    /// [`BranchOutcome::AlreadyExisted`] instead of an error.
    pub async fn create_branch(
        &self,
        project_id: u64,
        branch: &str,
        git_ref: &str,
    ) -> PlatformResult<BranchOutcome> {
        let url = format!("{}/projects/{}/repository/branches", self.base_api, project_id);
        debug!("GitLab create_branch: {} (branch={}, ref={})", url, branch, git_ref);

        let payload = GitLabBranchCreate {
            branch,
            git_ref,
        };

        let resp = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if is_success(status) {
            let raw: GitLabBranch = serde_json::from_str(&body)?;
            info!(branch, "GitLab branch created");
            return Ok(BranchOutcome::Created(raw.into_branch()));
        }

        if body.contains(BRANCH_EXISTS_MARKER) {
            info!(branch, "GitLab branch already exists, continuing");
            return Ok(BranchOutcome::AlreadyExisted(Branch {
                name: branch.to_string(),
                commit_sha: None,
            }));
        }

        warn!(%status, branch, "GitLab branch creation rejected");
        Err(PlatformError::http_status(status.as_u16(), &body))
    }

    /// Commits a single new file to `branch` so that a merge request from it
    /// has a non-empty diff.
    pub async fn commit_placeholder_file(
        &self,
        project_id: u64,
        branch: &str,
        file: &PlaceholderFile,
    ) -> PlatformResult<()> {
        let url = format!("{}/projects/{}/repository/commits", self.base_api, project_id);
        debug!("GitLab commit_placeholder_file: {} (path={})", url, file.file_path);

        let payload = GitLabCommitCreate {
            branch,
            commit_message: &file.commit_message,
            actions: vec![GitLabCommitAction {
                action: "create",
                file_path: &file.file_path,
                content: &file.content,
            }],
        };

        let resp = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?;

        success_body(resp).await?;
        Ok(())
    }

    /// Opens a merge request and returns its metadata together with the raw
    /// JSON object GitLab answered with.
    pub async fn create_change_request(
        &self,
        project_id: u64,
        source_branch: &str,
        target_branch: &str,
        title: &str,
        description: &str,
    ) -> PlatformResult<ChangeRequest> {
        let url = format!("{}/projects/{}/merge_requests", self.base_api, project_id);
        debug!(
            "GitLab create_change_request: {} ({} -> {})",
            url, source_branch, target_branch
        );

        let payload = GitLabMrCreate {
            source_branch,
            target_branch,
            title,
            description,
        };

        let resp = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&payload)
            .send()
            .await?;

        let body = success_body(resp).await?;
        let raw: serde_json::Value = serde_json::from_str(&body)?;
        let mr: GitLabMr = serde_json::from_value(raw.clone())?;

        Ok(ChangeRequest {
            id: mr.id,
            iid: mr.iid,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            title: mr.title,
            description: mr.description,
            web_url: mr.web_url,
            raw,
        })
    }

    /// Fetches file-level diffs of a merge request.
    ///
    /// An empty `changes` array is a valid result.
    pub async fn fetch_changes(&self, project_id: u64, iid: u64) -> PlatformResult<ChangeSet> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}/changes",
            self.base_api, project_id, iid
        );
        debug!("GitLab fetch_changes: {}", url);

        let resp = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;

        let body = success_body(resp).await?;
        let raw: GitLabMrChanges = serde_json::from_str(&body)?;

        debug!(files = raw.changes.len(), "GitLab changes fetched");
        Ok(ChangeSet { files: raw.changes })
    }

    /// Posts a note on a merge request and returns its id.
    pub async fn post_comment(
        &self,
        project_id: u64,
        iid: u64,
        body: &str,
    ) -> PlatformResult<CommentId> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}/notes",
            self.base_api, project_id, iid
        );
        debug!("GitLab post_comment: {} (len={})", url, body.len());

        let resp = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(&GitLabNoteCreate { body })
            .send()
            .await?;

        let text = success_body(resp).await?;
        let note: GitLabNote = serde_json::from_str(&text)?;
        Ok(CommentId(note.id))
    }

    /// Replaces the labels of a merge request.
    pub async fn set_labels(
        &self,
        project_id: u64,
        iid: u64,
        labels: &[String],
    ) -> PlatformResult<()> {
        let joined = labels.join(",");
        debug!("GitLab set_labels: project={} iid={} labels={}", project_id, iid, joined);

        let payload = GitLabMrUpdate {
            labels: Some(&joined),
            reviewer_ids: None,
        };
        self.update_merge_request(project_id, iid, &payload).await
    }

    /// Sets the reviewers of a merge request by user id.
    pub async fn assign_reviewers(
        &self,
        project_id: u64,
        iid: u64,
        reviewer_ids: &[u64],
    ) -> PlatformResult<()> {
        debug!(
            "GitLab assign_reviewers: project={} iid={} ids={:?}",
            project_id, iid, reviewer_ids
        );

        let payload = GitLabMrUpdate {
            labels: None,
            reviewer_ids: Some(reviewer_ids),
        };
        self.update_merge_request(project_id, iid, &payload).await
    }

    /// Resolves a username to a user id; `Ok(None)` when nobody matches.
    pub async fn find_user_id(&self, username: &str) -> PlatformResult<Option<u64>> {
        let url = format!("{}/users", self.base_api);
        debug!("GitLab find_user_id: {} (username={})", url, username);

        let resp = self
            .http
            .get(url)
            .query(&[("username", username)])
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;

        let body = success_body(resp).await?;
        let users: Vec<GitLabUser> = serde_json::from_str(&body)?;
        Ok(users.first().map(|u| u.id))
    }

    async fn update_merge_request(
        &self,
        project_id: u64,
        iid: u64,
        payload: &GitLabMrUpdate<'_>,
    ) -> PlatformResult<()> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}",
            self.base_api, project_id, iid
        );

        let resp = self
            .http
            .put(url)
            .header("PRIVATE-TOKEN", &self.token)
            .json(payload)
            .send()
            .await?;

        success_body(resp).await?;
        Ok(())
    }
}

fn is_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

/// Reads the body of a 200/201 response, or turns any other status into
/// [`PlatformError::HttpStatus`] carrying the body text.
async fn success_body(resp: Response) -> PlatformResult<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if is_success(status) {
        Ok(body)
    } else {
        Err(PlatformError::http_status(status.as_u16(), &body))
    }
}

#[derive(Debug, Deserialize)]
struct GitLabBranch {
    name: String,
    #[serde(default)]
    commit: Option<GitLabCommitRef>,
}

impl GitLabBranch {
    fn into_branch(self) -> Branch {
        Branch {
            name: self.name,
            commit_sha: self.commit.map(|c| c.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitLabCommitRef {
    id: String,
}

/// GitLab MR response (subset). The full object is kept as raw JSON.
#[derive(Debug, Deserialize)]
struct GitLabMr {
    #[serde(default)]
    id: u64,
    iid: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    web_url: String,
    #[serde(default)]
    source_branch: String,
    #[serde(default)]
    target_branch: String,
}

#[derive(Debug, Deserialize)]
struct GitLabMrChanges {
    #[serde(default)]
    changes: Vec<FileChange>,
}

#[derive(Debug, Deserialize)]
struct GitLabNote {
    id: u64,
}

#[derive(Debug, Serialize)]
struct GitLabBranchCreate<'a> {
    branch: &'a str,
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

#[derive(Debug, Serialize)]
struct GitLabMrCreate<'a> {
    source_branch: &'a str,
    target_branch: &'a str,
    title: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: u64,
}

#[derive(Debug, Serialize)]
struct GitLabMrUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reviewer_ids: Option<&'a [u64]>,
}

#[derive(Debug, Serialize)]
struct GitLabNoteCreate<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct GitLabCommitCreate<'a> {
    branch: &'a str,
    commit_message: &'a str,
    actions: Vec<GitLabCommitAction<'a>>,
}

#[derive(Debug, Serialize)]
struct GitLabCommitAction<'a> {
    action: &'static str,
    file_path: &'a str,
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const TOKEN: &str = "test_token";

    fn client(server: &mockito::ServerGuard) -> GitLabClient {
        GitLabClient::new(Client::new(), server.url(), TOKEN.to_string())
    }

    #[tokio::test]
    async fn find_branch_returns_none_on_404() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/projects/42/repository/branches/feature-x")
            .match_header("PRIVATE-TOKEN", TOKEN)
            .with_status(404)
            .with_body(r#"{"message":"404 Branch Not Found"}"#)
            .create_async()
            .await;

        let found = client(&server).find_branch(42, "feature-x").await.unwrap();
        assert!(found.is_none());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn find_branch_reads_head_commit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/42/repository/branches/main")
            .with_status(200)
            .with_body(r#"{"name":"main","commit":{"id":"abc123"}}"#)
            .create_async()
            .await;

        let found = client(&server).find_branch(42, "main").await.unwrap();
        assert_eq!(
            found,
            Some(Branch {
                name: "main".into(),
                commit_sha: Some("abc123".into()),
            })
        );
    }

    #[tokio::test]
    async fn find_branch_fails_on_unexpected_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/42/repository/branches/main")
            .with_status(401)
            .with_body(r#"{"message":"401 Unauthorized"}"#)
            .create_async()
            .await;

        let err = client(&server).find_branch(42, "main").await.unwrap_err();
        match err {
            PlatformError::HttpStatus { status, snippet } => {
                assert_eq!(status, 401);
                assert!(snippet.contains("401 Unauthorized"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_branch_sends_name_and_ref() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/projects/42/repository/branches")
            .match_header("PRIVATE-TOKEN", TOKEN)
            .match_body(Matcher::Json(json!({"branch": "feature-x", "ref": "main"})))
            .with_status(201)
            .with_body(r#"{"name":"feature-x","commit":{"id":"def456"}}"#)
            .create_async()
            .await;

        let outcome = client(&server)
            .create_branch(42, "feature-x", "main")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BranchOutcome::Created(Branch {
                name: "feature-x".into(),
                commit_sha: Some("def456".into()),
            })
        );
        m.assert_async().await;
    }

    #[tokio::test]
    async fn create_branch_twice_is_idempotent() {
        let mut server = mockito::Server::new_async().await;
        let gl = client(&server);

        let created = server
            .mock("POST", "/projects/42/repository/branches")
            .with_status(201)
            .with_body(r#"{"name":"feature-x","commit":{"id":"def456"}}"#)
            .expect(1)
            .create_async()
            .await;
        let first = gl.create_branch(42, "feature-x", "main").await.unwrap();
        assert!(first.was_created());
        created.assert_async().await;
        created.remove_async().await;

        server
            .mock("POST", "/projects/42/repository/branches")
            .with_status(400)
            .with_body(r#"{"message":"Branch already exists"}"#)
            .create_async()
            .await;
        let second = gl.create_branch(42, "feature-x", "main").await.unwrap();
        assert!(!second.was_created());
        assert_eq!(second.branch().name, "feature-x");
    }

    #[tokio::test]
    async fn create_branch_other_rejection_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/projects/42/repository/branches")
            .with_status(400)
            .with_body(r#"{"message":"Invalid reference name: nope"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .create_branch(42, "feature-x", "nope")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid reference name"));
    }

    #[tokio::test]
    async fn create_change_request_keeps_raw_json() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "id": 1001,
            "iid": 7,
            "title": "Add X",
            "description": "",
            "source_branch": "feature-x",
            "target_branch": "main",
            "web_url": "https://example/mr/7",
            "state": "opened"
        });
        server
            .mock("POST", "/projects/42/merge_requests")
            .match_body(Matcher::PartialJson(json!({
                "source_branch": "feature-x",
                "target_branch": "main",
                "title": "Add X"
            })))
            .with_status(201)
            .with_body(body.to_string())
            .create_async()
            .await;

        let mr = client(&server)
            .create_change_request(42, "feature-x", "main", "Add X", "")
            .await
            .unwrap();
        assert_eq!(mr.iid, 7);
        assert_eq!(mr.id, 1001);
        assert_eq!(mr.web_url, "https://example/mr/7");
        assert_eq!(mr.raw, body);
    }

    #[tokio::test]
    async fn create_change_request_conflict_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/projects/42/merge_requests")
            .with_status(409)
            .with_body(r#"{"message":["Another open merge request already exists"]}"#)
            .create_async()
            .await;

        let err = client(&server)
            .create_change_request(42, "feature-x", "main", "Add X", "")
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::HttpStatus { status: 409, .. }));
    }

    #[tokio::test]
    async fn fetch_changes_preserves_order_and_defaults() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/42/merge_requests/7/changes")
            .with_status(200)
            .with_body(
                json!({
                    "iid": 7,
                    "changes": [
                        {"old_path": "b.rs", "new_path": "b.rs", "diff": "+b"},
                        {"old_path": "a.rs", "new_path": "a.rs"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let set = client(&server).fetch_changes(42, 7).await.unwrap();
        let paths: Vec<_> = set.files.iter().map(|f| f.display_path()).collect();
        assert_eq!(paths, ["b.rs", "a.rs"]);
        assert_eq!(set.files[1].diff, "");
    }

    #[tokio::test]
    async fn fetch_changes_empty_list_is_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/42/merge_requests/7/changes")
            .with_status(200)
            .with_body(r#"{"changes":[]}"#)
            .create_async()
            .await;

        let set = client(&server).fetch_changes(42, 7).await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn post_comment_returns_note_id() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/projects/42/merge_requests/7/notes")
            .match_header("PRIVATE-TOKEN", TOKEN)
            .match_body(Matcher::Json(json!({"body": "hello"})))
            .with_status(201)
            .with_body(r#"{"id":555,"body":"hello"}"#)
            .create_async()
            .await;

        let id = client(&server).post_comment(42, 7, "hello").await.unwrap();
        assert_eq!(id, CommentId(555));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn commit_placeholder_file_posts_create_action() {
        let mut server = mockito::Server::new_async().await;
        let file = PlaceholderFile::default();
        let m = server
            .mock("POST", "/projects/42/repository/commits")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"branch": "feature-x"})),
                Matcher::Regex(r#""action":"create""#.into()),
                Matcher::Regex(file.file_path.clone()),
            ]))
            .with_status(201)
            .with_body(r#"{"id":"c0ffee"}"#)
            .create_async()
            .await;

        client(&server)
            .commit_placeholder_file(42, "feature-x", &file)
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn set_labels_puts_comma_joined_list() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PUT", "/projects/42/merge_requests/7")
            .match_header("PRIVATE-TOKEN", TOKEN)
            .match_body(Matcher::Json(json!({"labels": "bug,test"})))
            .with_status(200)
            .with_body(r#"{"iid":7,"labels":["bug","test"]}"#)
            .create_async()
            .await;

        client(&server)
            .set_labels(42, 7, &["bug".to_string(), "test".to_string()])
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn assign_reviewers_puts_ids() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PUT", "/projects/42/merge_requests/7")
            .match_body(Matcher::Json(json!({"reviewer_ids": [11, 12]})))
            .with_status(200)
            .with_body(r#"{"iid":7}"#)
            .create_async()
            .await;

        client(&server).assign_reviewers(42, 7, &[11, 12]).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn find_user_id_takes_first_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users")
            .match_query(Matcher::UrlEncoded("username".into(), "alice".into()))
            .with_status(200)
            .with_body(r#"[{"id":11,"username":"alice"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users")
            .match_query(Matcher::UrlEncoded("username".into(), "nobody".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let gl = client(&server);
        assert_eq!(gl.find_user_id("alice").await.unwrap(), Some(11));
        assert_eq!(gl.find_user_id("nobody").await.unwrap(), None);
    }
}
