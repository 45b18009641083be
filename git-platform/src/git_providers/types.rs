//! Provider-agnostic data model for branches, merge requests and diffs.

use serde::{Deserialize, Serialize};

/// Supported Git providers used at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderKind {
    GitLab,
}

/// A branch as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// Head commit of the branch when the platform reported it.
    pub commit_sha: Option<String>,
}

/// Outcome of an idempotent branch creation.
///
/// Callers can tell a freshly created branch from one that was already there;
/// both are successful results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    Created(Branch),
    AlreadyExisted(Branch),
}

impl BranchOutcome {
    pub fn branch(&self) -> &Branch {
        match self {
            BranchOutcome::Created(b) | BranchOutcome::AlreadyExisted(b) => b,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, BranchOutcome::Created(_))
    }
}

/// Metadata of a merge request returned by the creation call.
///
/// `raw` keeps the platform's JSON object exactly as it was received so that
/// it can be handed back to callers unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRequest {
    /// Global internal id.
    pub id: u64,
    /// Per-project sequential id used by follow-up calls.
    pub iid: u64,
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    pub description: Option<String>,
    pub web_url: String,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

/// File-level change with its unified diff text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    #[serde(default)]
    pub old_path: String,
    #[serde(default)]
    pub new_path: String,
    /// Unified diff text; empty for binary or oversized files.
    #[serde(default)]
    pub diff: String,
}

impl FileChange {
    /// Path used to label the file: new path, falling back to the old one.
    pub fn display_path(&self) -> &str {
        if self.new_path.is_empty() {
            &self.old_path
        } else {
            &self.new_path
        }
    }
}

/// The full set of changes for a merge request, in platform order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub files: Vec<FileChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Identifier of a note posted on a merge request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CommentId(pub u64);

/// File committed to a branch by the optional placeholder setup step.
#[derive(Debug, Clone)]
pub struct PlaceholderFile {
    pub file_path: String,
    pub content: String,
    pub commit_message: String,
}

impl Default for PlaceholderFile {
    fn default() -> Self {
        Self {
            file_path: "dummy_file_for_ai_review.txt".into(),
            content: "This is a dummy file to trigger AI code review.".into(),
            commit_message: "Add dummy file for AI review".into(),
        }
    }
}
