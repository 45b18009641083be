use git_platform::{BranchOutcome, CommentId};
use mr_reviewer::WorkflowSummary;
use serde::Serialize;

pub const SUCCESS_MESSAGE: &str = "Merge Request created and reviewed";

/// Response body after a completed workflow.
#[derive(Debug, Serialize)]
pub struct CreateBranchMrResponse {
    pub message: &'static str,
    /// Merge request object exactly as the platform returned it.
    pub merge_request: serde_json::Value,
    /// The comment body that was posted.
    pub ai_code_review: String,
    pub branch: BranchStatus,
    pub comment_id: CommentId,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewer_ids: Vec<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    Created,
    AlreadyExisted,
}

impl From<&BranchOutcome> for BranchStatus {
    fn from(o: &BranchOutcome) -> Self {
        match o {
            BranchOutcome::Created(_) => BranchStatus::Created,
            BranchOutcome::AlreadyExisted(_) => BranchStatus::AlreadyExisted,
        }
    }
}

impl From<WorkflowSummary> for CreateBranchMrResponse {
    fn from(s: WorkflowSummary) -> Self {
        Self {
            message: SUCCESS_MESSAGE,
            branch: BranchStatus::from(&s.branch),
            merge_request: s.change_request.raw,
            ai_code_review: s.review,
            comment_id: s.comment_id,
            labels: s.labels,
            reviewer_ids: s.reviewer_ids,
        }
    }
}
