//! Label suggestion: a second, optional model call over the whole diff.
//!
//! Only labels from [`ALLOWED_LABELS`] survive parsing, at most
//! [`MAX_LABELS`] of them, in reply order.

/// Labels the model may choose from.
pub const ALLOWED_LABELS: [&str; 5] = ["bug", "feature", "docs", "refactor", "test"];

/// Applied without a model call when there is nothing to look at.
pub const NO_CHANGES_LABEL: &str = "no-changes";

pub const MAX_LABELS: usize = 3;

pub const LABEL_SYSTEM_PROMPT: &str =
    "You triage merge requests. Answer with a comma-separated list of labels and nothing else.";

pub fn build_label_prompt(diff: &str) -> String {
    format!(
        "Suggest up to three labels (bug, feature, docs, refactor, test) \
         for this diff:\n{diff}\nLabels:"
    )
}

/// Extracts known labels from a free-form reply.
pub fn parse_labels(reply: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in reply.split([',', '\n']) {
        let label = raw
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_ascii_lowercase();
        if ALLOWED_LABELS.contains(&label.as_str()) && !out.contains(&label) {
            out.push(label);
        }
        if out.len() == MAX_LABELS {
            break;
        }
    }
    out
}
