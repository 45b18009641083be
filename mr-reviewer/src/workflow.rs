//! Workflow orchestrator: branch → merge request → diff → review → note.
//!
//! Stateless between runs; everything a run needs arrives in the
//! [`WorkflowRequest`]. Remote side effects already made (branch, merge
//! request) are not rolled back when a later step fails.
//!
//! Two optional steps never abort a run: reviewer assignment right after the
//! merge request opens, and label suggestion after the note is posted.

use std::time::Instant;

use git_platform::{
    BranchOutcome, ChangeRequest, ChangeSet, CommentId, PlaceholderFile, PlatformResult,
    ProviderClient,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    errors::{WorkflowError, WorkflowResult},
    review::{
        generator::ReviewGenerator,
        policy::{ReviewPolicy, join_diffs},
        review_change_set,
    },
};

/// Default number of per-file reviews in flight.
pub const DEFAULT_REVIEW_CONCURRENCY: usize = 4;

/// Input of one workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRequest {
    pub project_id: u64,
    pub source_branch: String,
    pub target_branch: String,
    pub new_branch_name: String,
    pub mr_title: String,
    pub mr_description: String,
    /// Platform usernames to request a review from; may be empty.
    pub reviewers: Vec<String>,
}

impl WorkflowRequest {
    /// Rejects a zero project id, blank branch or title fields and blank
    /// reviewer names.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.project_id == 0 {
            return Err(WorkflowError::Validation {
                field: "project_id",
                reason: "must be a positive integer",
            });
        }
        let required = [
            ("source_branch", &self.source_branch),
            ("target_branch", &self.target_branch),
            ("new_branch_name", &self.new_branch_name),
            ("mr_title", &self.mr_title),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(WorkflowError::Validation {
                    field,
                    reason: "must not be empty",
                });
            }
        }
        if self.reviewers.iter().any(|r| r.trim().is_empty()) {
            return Err(WorkflowError::Validation {
                field: "reviewers",
                reason: "must not contain blank usernames",
            });
        }
        Ok(())
    }
}

/// Behavioural knobs fixed at startup.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub policy: ReviewPolicy,
    /// Upper bound on concurrent per-file model calls (min 1).
    pub review_concurrency: usize,
    /// When set, this file is committed to the new branch before the merge
    /// request is opened. Rewrites repository history; off by default.
    pub placeholder_commit: Option<PlaceholderFile>,
    /// Ask the model for labels and apply them to the merge request.
    pub suggest_labels: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            policy: ReviewPolicy::PerFile,
            review_concurrency: DEFAULT_REVIEW_CONCURRENCY,
            placeholder_commit: None,
            suggest_labels: false,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct WorkflowSummary {
    pub branch: BranchOutcome,
    pub change_request: ChangeRequest,
    /// Comment body exactly as posted.
    pub review: String,
    pub comment_id: CommentId,
    /// Labels applied to the merge request; empty when none were set.
    pub labels: Vec<String>,
    /// Reviewer ids assigned to the merge request.
    pub reviewer_ids: Vec<u64>,
}

pub struct ReviewWorkflow {
    platform: ProviderClient,
    generator: ReviewGenerator,
    settings: WorkflowSettings,
}

impl ReviewWorkflow {
    pub fn new(
        platform: ProviderClient,
        generator: ReviewGenerator,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            platform,
            generator,
            settings,
        }
    }

    /// Runs all steps for `req`.
    ///
    /// # Errors
    /// The first abort-class failure, tagged with its step. Review
    /// generation, reviewer and label failures are not errors.
    #[instrument(
        name = "review_workflow",
        skip(self, req),
        fields(project_id = req.project_id, branch = %req.new_branch_name)
    )]
    pub async fn run(&self, req: &WorkflowRequest) -> WorkflowResult<WorkflowSummary> {
        let t0 = Instant::now();
        req.validate()?;

        // 1) EnsureBranch
        let branch = self
            .ensure_branch(req)
            .await
            .map_err(|e| abort(WorkflowError::Branch(e)))?;
        info!(created = branch.was_created(), "step1: branch ready");

        if let Some(file) = &self.settings.placeholder_commit {
            debug!(path = %file.file_path, "step1: placeholder commit");
            self.platform
                .commit_placeholder_file(req.project_id, &req.new_branch_name, file)
                .await
                .map_err(|e| abort(WorkflowError::Setup(e)))?;
        }

        // 2) OpenChangeRequest
        let change_request = self
            .platform
            .create_change_request(
                req.project_id,
                &req.new_branch_name,
                &req.target_branch,
                &req.mr_title,
                &req.mr_description,
            )
            .await
            .map_err(|e| abort(WorkflowError::ChangeRequest(e)))?;
        info!(iid = change_request.iid, "step2: merge request opened");

        let reviewer_ids = self.assign_reviewers(req, change_request.iid).await;

        // 3) FetchDiff
        let changes = self
            .platform
            .fetch_changes(req.project_id, change_request.iid)
            .await
            .map_err(|e| abort(WorkflowError::FetchChanges(e)))?;
        info!(files = changes.files.len(), "step3: diff fetched");

        // 4) GenerateReview
        let review = review_change_set(
            &self.generator,
            &changes,
            self.settings.policy,
            self.settings.review_concurrency,
        )
        .await;

        // 5) PostComment
        let comment_id = self
            .platform
            .post_comment(req.project_id, change_request.iid, &review)
            .await
            .map_err(|e| abort(WorkflowError::Comment(e)))?;
        info!(
            note_id = comment_id.0,
            ms = t0.elapsed().as_millis(),
            "step5: review posted"
        );

        let labels = self
            .apply_labels(req.project_id, change_request.iid, &changes)
            .await;

        Ok(WorkflowSummary {
            branch,
            change_request,
            review,
            comment_id,
            labels,
            reviewer_ids,
        })
    }

    /// Lookup first, create only when missing.
    async fn ensure_branch(&self, req: &WorkflowRequest) -> PlatformResult<BranchOutcome> {
        if let Some(existing) = self
            .platform
            .find_branch(req.project_id, &req.new_branch_name)
            .await?
        {
            debug!("step1: branch already present, skipping creation");
            return Ok(BranchOutcome::AlreadyExisted(existing));
        }
        self.platform
            .create_branch(req.project_id, &req.new_branch_name, &req.source_branch)
            .await
    }

    /// Resolves `req.reviewers` and assigns the known ones. Unknown names are
    /// skipped; any failure leaves the merge request without reviewers.
    async fn assign_reviewers(&self, req: &WorkflowRequest, iid: u64) -> Vec<u64> {
        let mut ids = Vec::with_capacity(req.reviewers.len());
        for name in &req.reviewers {
            match self.platform.find_user_id(name.trim()).await {
                Ok(Some(id)) if !ids.contains(&id) => ids.push(id),
                Ok(Some(_)) => {}
                Ok(None) => warn!(username = %name, "reviewers: unknown user, skipped"),
                Err(e) => warn!(username = %name, error = %e, "reviewers: lookup failed"),
            }
        }
        if ids.is_empty() {
            return ids;
        }

        match self
            .platform
            .assign_reviewers(req.project_id, iid, &ids)
            .await
        {
            Ok(()) => {
                info!(count = ids.len(), "step2: reviewers assigned");
                ids
            }
            Err(e) => {
                warn!(error = %e, "reviewers: assignment failed");
                Vec::new()
            }
        }
    }

    async fn apply_labels(&self, project_id: u64, iid: u64, changes: &ChangeSet) -> Vec<String> {
        if !self.settings.suggest_labels {
            return Vec::new();
        }
        let Some(labels) = self.generator.suggest_labels(&join_diffs(changes)).await else {
            return Vec::new();
        };
        if labels.is_empty() {
            debug!("labels: model suggested nothing usable");
            return labels;
        }

        match self.platform.set_labels(project_id, iid, &labels).await {
            Ok(()) => {
                info!(?labels, "labels applied");
                labels
            }
            Err(e) => {
                warn!(error = %e, "labels: update failed");
                Vec::new()
            }
        }
    }
}

fn abort(err: WorkflowError) -> WorkflowError {
    warn!(step = err.step(), error = %err, "workflow aborted");
    err
}
