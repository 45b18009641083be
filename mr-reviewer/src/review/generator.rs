//! Review Generator: diff text in, review text out.
//!
//! Never fails. Empty input short-circuits without a remote call; model
//! failures are logged and turned into a readable line in the review.

use ai_llm_service::OpenAiService;
use tracing::{debug, warn};

use crate::review::{
    labels::{LABEL_SYSTEM_PROMPT, NO_CHANGES_LABEL, build_label_prompt, parse_labels},
    prompt::{SYSTEM_PROMPT, build_review_prompt},
};

/// Returned for an empty or whitespace-only diff.
pub const NO_CHANGES_MESSAGE: &str = "No diff content to review.";

const FAILURE_PREFIX: &str = "Failed to generate code review";

/// Wraps the completion client with the review prompt.
#[derive(Debug, Clone)]
pub struct ReviewGenerator {
    llm: OpenAiService,
}

impl ReviewGenerator {
    pub fn new(llm: OpenAiService) -> Self {
        Self { llm }
    }

    /// Produces review text for `diff`.
    ///
    /// - blank diff → [`NO_CHANGES_MESSAGE`], no request sent
    /// - model failure → `"Failed to generate code review: <error>"`
    /// - otherwise the trimmed model output
    pub async fn review(&self, diff: &str) -> String {
        if diff.trim().is_empty() {
            debug!("review: empty diff, skipping model call");
            return NO_CHANGES_MESSAGE.to_string();
        }

        let prompt = build_review_prompt(diff);
        debug!(
            model = self.llm.model(),
            diff_len = diff.len(),
            "review: calling model"
        );

        match self.llm.chat(SYSTEM_PROMPT, &prompt).await {
            Ok(out) => out.content.trim().to_string(),
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), "review: generation failed");
                format!("{FAILURE_PREFIX}: {e}")
            }
        }
    }

    /// Suggests merge request labels for `diff`.
    ///
    /// Blank diff gives `["no-changes"]` without a request. `None` when the
    /// model call fails; the failure is only logged.
    pub async fn suggest_labels(&self, diff: &str) -> Option<Vec<String>> {
        if diff.trim().is_empty() {
            return Some(vec![NO_CHANGES_LABEL.to_string()]);
        }

        match self.llm.chat(LABEL_SYSTEM_PROMPT, &build_label_prompt(diff)).await {
            Ok(out) => {
                let labels = parse_labels(&out.content);
                debug!(?labels, "labels: parsed model reply");
                Some(labels)
            }
            Err(e) => {
                warn!(error = %e, "labels: suggestion failed");
                None
            }
        }
    }
}
