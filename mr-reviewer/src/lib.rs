//! Public entry for the mr-reviewer workflow.
//!
//! One call, [`ReviewWorkflow::run`], drives a request through five steps:
//!
//! 1) **EnsureBranch**: look the new branch up, create it from the source
//!    branch when missing (optionally commit a placeholder file afterwards)
//! 2) **OpenChangeRequest**: open a merge request from the new branch into
//!    the target branch
//! 3) **FetchDiff**: read the merge request's per-file diffs
//! 4) **GenerateReview**: ask the LLM for a review, per file or for the whole
//!    diff depending on [`ReviewPolicy`]
//! 5) **PostComment**: publish the assembled review as one note
//!
//! Steps 1, 2, 3 and 5 abort the run on failure. Step 4 never does: a failed
//! model call becomes text inside the review.
//! Reviewer assignment (after step 2) and label suggestion (after step 5)
//! are optional and only logged when they fail.
//!
//! No `async-trait` and no heap trait objects: the platform client and the
//! LLM client are concrete values handed to the constructor.

pub mod errors;
pub mod review;
pub mod workflow;

pub use errors::{WorkflowError, WorkflowResult};
pub use review::{
    generator::{NO_CHANGES_MESSAGE, ReviewGenerator},
    policy::ReviewPolicy,
};
pub use workflow::{ReviewWorkflow, WorkflowRequest, WorkflowSettings, WorkflowSummary};
