use std::sync::Arc;

use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::HeaderMap,
};
use mr_reviewer::WorkflowRequest;
use tracing::{debug, info, instrument};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::create_branch_mr::{
        create_branch_mr_request::CreateBranchMrRequest,
        create_branch_mr_response::CreateBranchMrResponse,
    },
};

/// HTTP endpoint that creates a branch and merge request, then reviews it.
///
/// Runs the whole workflow inside the request; the response arrives after
/// the review note has been posted.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/create-branch-mr/ \
///   -H 'content-type: application/json' \
///   -d '{"project_id":42,"source_branch":"main","target_branch":"main",
///        "new_branch_name":"feature/x","mr_title":"Add X"}'
/// ```
#[instrument(name = "create_branch_mr_route", skip(state, headers, body))]
pub async fn create_branch_mr(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateBranchMrRequest>, JsonRejection>,
) -> AppResult<Json<CreateBranchMrResponse>> {
    if let Some(id) = headers.get("X-Request-Id").and_then(|h| h.to_str().ok()) {
        debug!(%id, "request id attached");
    }

    let Json(body) = body?;
    let req = WorkflowRequest::from(body);

    info!(
        project_id = req.project_id,
        new_branch = %req.new_branch_name,
        target = %req.target_branch,
        "starting branch + MR + review workflow"
    );

    let summary = state.workflow.run(&req).await?;
    Ok(Json(summary.into()))
}
