use mr_reviewer::WorkflowRequest;
use serde::Deserialize;

/// Request body for `POST /create-branch-mr/`.
#[derive(Debug, Deserialize)]
pub struct CreateBranchMrRequest {
    /// Numeric GitLab project id.
    pub project_id: u64,
    /// Branch the new branch is cut from.
    pub source_branch: String,
    /// Merge request target.
    pub target_branch: String,
    pub new_branch_name: String,
    pub mr_title: String,
    #[serde(default)]
    pub mr_description: String,
    /// Usernames to request a review from. Unknown names are skipped.
    #[serde(default)]
    pub reviewers: Vec<String>,
}

impl From<CreateBranchMrRequest> for WorkflowRequest {
    fn from(r: CreateBranchMrRequest) -> Self {
        WorkflowRequest {
            project_id: r.project_id,
            source_branch: r.source_branch,
            target_branch: r.target_branch,
            new_branch_name: r.new_branch_name,
            mr_title: r.mr_title,
            mr_description: r.mr_description,
            reviewers: r.reviewers,
        }
    }
}
