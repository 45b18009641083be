//! Provider facade without async-trait or dynamic trait objects.
//!
//! This module exposes an enum `ProviderClient` that wraps concrete
//! implementations for each Git platform. It gives the workflow a uniform
//! interface for:
//!   * checking and creating branches
//!   * opening merge requests and reading their diffs
//!   * posting notes back to the merge request.

pub mod types;
pub use types::*;

pub mod gitlab;

use std::time::Duration;

use crate::errors::{PlatformConfigError, PlatformResult};
use tracing::debug;

/// Default request timeout applied to every platform call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for any provider client.
///
/// Built once at startup from the environment and passed in explicitly.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// API base, e.g. "https://gitlab.com/api/v4".
    pub base_api: String,
    /// Access token for the platform (PAT or project token).
    pub token: String,
    /// Upper bound for a single request, in seconds.
    pub timeout_secs: u64,
}

/// Concrete provider client with enum dispatch.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    GitLab(gitlab::GitLabClient),
}

impl ProviderClient {
    /// Constructs a concrete provider client from generic configuration.
    ///
    /// The underlying HTTP client is configured with a stable user agent and
    /// a bounded timeout.
    pub fn from_config(cfg: ProviderConfig) -> PlatformResult<Self> {
        debug!(
            "Initializing provider client: kind={:?}, base_api={}",
            cfg.kind, cfg.base_api
        );

        if cfg.token.trim().is_empty() {
            return Err(PlatformConfigError::MissingToken.into());
        }

        let base_api = cfg.base_api.trim().trim_end_matches('/').to_string();
        if !(base_api.starts_with("http://") || base_api.starts_with("https://")) {
            return Err(PlatformConfigError::InvalidBaseUrl(cfg.base_api).into());
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("git-platform/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;

        let client = match cfg.kind {
            ProviderKind::GitLab => {
                ProviderClient::GitLab(gitlab::GitLabClient::new(client, base_api, cfg.token))
            }
        };

        Ok(client)
    }

    /// Returns `true` when the branch exists, `false` when the platform
    /// reports it as not found.
    pub async fn branch_exists(&self, project_id: u64, branch: &str) -> PlatformResult<bool> {
        Ok(self.find_branch(project_id, branch).await?.is_some())
    }

    /// Looks a branch up; `Ok(None)` when the platform reports 404.
    pub async fn find_branch(
        &self,
        project_id: u64,
        branch: &str,
    ) -> PlatformResult<Option<Branch>> {
        match self {
            Self::GitLab(c) => c.find_branch(project_id, branch).await,
        }
    }

    /// Creates `branch` from `git_ref`, treating "already exists" as success.
    pub async fn create_branch(
        &self,
        project_id: u64,
        branch: &str,
        git_ref: &str,
    ) -> PlatformResult<BranchOutcome> {
        match self {
            Self::GitLab(c) => c.create_branch(project_id, branch, git_ref).await,
        }
    }

    /// Commits a single new file to `branch`.
    pub async fn commit_placeholder_file(
        &self,
        project_id: u64,
        branch: &str,
        file: &PlaceholderFile,
    ) -> PlatformResult<()> {
        match self {
            Self::GitLab(c) => c.commit_placeholder_file(project_id, branch, file).await,
        }
    }

    /// Opens a merge request from `source_branch` into `target_branch`.
    pub async fn create_change_request(
        &self,
        project_id: u64,
        source_branch: &str,
        target_branch: &str,
        title: &str,
        description: &str,
    ) -> PlatformResult<ChangeRequest> {
        match self {
            Self::GitLab(c) => {
                c.create_change_request(
                    project_id,
                    source_branch,
                    target_branch,
                    title,
                    description,
                )
                .await
            }
        }
    }

    /// Fetches the per-file diffs of a merge request.
    pub async fn fetch_changes(&self, project_id: u64, iid: u64) -> PlatformResult<ChangeSet> {
        match self {
            Self::GitLab(c) => c.fetch_changes(project_id, iid).await,
        }
    }

    /// Posts a general (non-inline) note on a merge request.
    pub async fn post_comment(
        &self,
        project_id: u64,
        iid: u64,
        body: &str,
    ) -> PlatformResult<CommentId> {
        match self {
            Self::GitLab(c) => c.post_comment(project_id, iid, body).await,
        }
    }

    /// Replaces the labels of a merge request.
    pub async fn set_labels(
        &self,
        project_id: u64,
        iid: u64,
        labels: &[String],
    ) -> PlatformResult<()> {
        match self {
            Self::GitLab(c) => c.set_labels(project_id, iid, labels).await,
        }
    }

    /// Sets merge request reviewers by user id.
    pub async fn assign_reviewers(
        &self,
        project_id: u64,
        iid: u64,
        reviewer_ids: &[u64],
    ) -> PlatformResult<()> {
        match self {
            Self::GitLab(c) => c.assign_reviewers(project_id, iid, reviewer_ids).await,
        }
    }

    /// Resolves a username to a platform user id.
    pub async fn find_user_id(&self, username: &str) -> PlatformResult<Option<u64>> {
        match self {
            Self::GitLab(c) => c.find_user_id(username).await,
        }
    }
}
