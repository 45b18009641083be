//! Workflow error hierarchy.
//!
//! Each abort-class step has its own variant so callers can map failures to
//! stable codes. The platform error is kept as the source and its text is
//! part of the message, so the underlying reason reaches the HTTP caller.

use git_platform::PlatformError;
use thiserror::Error;

/// Convenient alias for workflow results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Request rejected before any remote call.
    #[error("invalid request: `{field}` {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    /// Branch lookup or creation failed.
    #[error("Branch check/creation failed: {0}")]
    Branch(#[source] PlatformError),

    /// Optional placeholder commit failed.
    #[error("Commit failed: {0}")]
    Setup(#[source] PlatformError),

    #[error("Merge request creation failed: {0}")]
    ChangeRequest(#[source] PlatformError),

    #[error("Failed to fetch MR diff: {0}")]
    FetchChanges(#[source] PlatformError),

    #[error("Failed to post MR comment: {0}")]
    Comment(#[source] PlatformError),
}

impl WorkflowError {
    /// Step name used in logs.
    pub fn step(&self) -> &'static str {
        match self {
            WorkflowError::Validation { .. } => "validate",
            WorkflowError::Branch(_) => "ensure_branch",
            WorkflowError::Setup(_) => "placeholder_commit",
            WorkflowError::ChangeRequest(_) => "open_change_request",
            WorkflowError::FetchChanges(_) => "fetch_diff",
            WorkflowError::Comment(_) => "post_comment",
        }
    }
}
