//! Review granularity and comment assembly.

use std::{fmt, str::FromStr};

use git_platform::ChangeSet;
use serde::{Deserialize, Serialize};

use crate::review::generator::NO_CHANGES_MESSAGE;

/// Heading of every review comment.
pub const REVIEW_HEADING: &str = "### AI Code Review";

/// How the change set is split into model calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    /// One call per file, one section per file.
    #[default]
    PerFile,
    /// All diffs concatenated, one call.
    WholeDiff,
}

impl FromStr for ReviewPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_file" => Ok(Self::PerFile),
            "whole_diff" => Ok(Self::WholeDiff),
            other => Err(format!(
                "unknown review policy `{other}` (expected per_file or whole_diff)"
            )),
        }
    }
}

impl fmt::Display for ReviewPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerFile => f.write_str("per_file"),
            Self::WholeDiff => f.write_str("whole_diff"),
        }
    }
}

/// Builds a per-file comment body. `sections` are `(path, review)` in
/// platform order.
pub fn assemble_per_file(sections: &[(String, String)]) -> String {
    if sections.is_empty() {
        return format!("{REVIEW_HEADING}\n\n{NO_CHANGES_MESSAGE}");
    }
    let blocks: Vec<String> = sections
        .iter()
        .map(|(path, review)| format!("### Review for `{path}`\n{review}"))
        .collect();
    format!("{REVIEW_HEADING}\n\n{}", blocks.join("\n\n"))
}

/// Builds a whole-diff comment body.
pub fn assemble_whole_diff(review: &str) -> String {
    format!("{REVIEW_HEADING}\n\n{review}")
}

/// Joins every file diff with a newline, in platform order.
pub fn join_diffs(changes: &ChangeSet) -> String {
    changes
        .files
        .iter()
        .map(|f| f.diff.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_platform::FileChange;

    fn file(path: &str, diff: &str) -> FileChange {
        FileChange {
            old_path: path.into(),
            new_path: path.into(),
            diff: diff.into(),
        }
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("per_file".parse::<ReviewPolicy>().unwrap(), ReviewPolicy::PerFile);
        assert_eq!("Whole-Diff".parse::<ReviewPolicy>().unwrap(), ReviewPolicy::WholeDiff);
        assert!("both".parse::<ReviewPolicy>().is_err());
        assert_eq!(ReviewPolicy::default(), ReviewPolicy::PerFile);
    }

    #[test]
    fn per_file_layout() {
        let body = assemble_per_file(&[
            ("a.txt".into(), "Looks fine.".into()),
            ("b.rs".into(), "Rename x.".into()),
        ]);
        assert_eq!(
            body,
            "### AI Code Review\n\n\
             ### Review for `a.txt`\nLooks fine.\n\n\
             ### Review for `b.rs`\nRename x."
        );
    }

    #[test]
    fn per_file_without_files_says_so() {
        assert_eq!(
            assemble_per_file(&[]),
            "### AI Code Review\n\nNo diff content to review."
        );
    }

    #[test]
    fn whole_diff_joins_with_newline() {
        let set = ChangeSet {
            files: vec![file("a", "+1"), file("b", ""), file("c", "+3")],
        };
        assert_eq!(join_diffs(&set), "+1\n\n+3");
        assert_eq!(assemble_whole_diff("ok"), "### AI Code Review\n\nok");
    }
}
