//! Thin async client for the code-hosting platform (GitLab REST v4).
//!
//! Every call is a single request/response with no retained state and no
//! retries. Success is HTTP 200/201; branch creation additionally accepts the
//! platform's "already exists" rejection and reports it as
//! [`BranchOutcome::AlreadyExisted`].

pub mod errors;
pub mod git_providers;

pub use errors::{PlatformConfigError, PlatformError, PlatformResult};
pub use git_providers::{
    Branch, BranchOutcome, ChangeRequest, ChangeSet, CommentId, FileChange, PlaceholderFile,
    ProviderClient, ProviderConfig, ProviderKind,
};
