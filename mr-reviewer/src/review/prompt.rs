//! Prompt builders for the review call.
//!
//! The diff is embedded verbatim; no trimming, no code fences.

/// System instruction sent with every review request.
pub const SYSTEM_PROMPT: &str =
    "You are a senior software engineer performing code review. Provide detailed feedback.";

/// User message for one diff (a single file or the whole change set).
pub fn build_review_prompt(diff: &str) -> String {
    let mut s = String::with_capacity(diff.len() + 96);
    s.push_str("Here is the code diff:\n");
    s.push_str(diff);
    s.push_str("\nPlease highlight issues, suggest improvements, and give best practices.");
    s
}
