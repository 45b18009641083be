//! Step 4: turn a change set into one review comment body.
//!
//! Logs:
//! - `INFO`: policy, file count, total time
//! - `DEBUG`: per-file timings

pub mod generator;
pub mod labels;
pub mod policy;
pub mod prompt;

use std::time::Instant;

use futures::{StreamExt, stream};
use git_platform::{ChangeSet, FileChange};
use tracing::{debug, info};

use generator::ReviewGenerator;
use policy::{ReviewPolicy, assemble_per_file, assemble_whole_diff, join_diffs};

/// Reviews `changes` under `policy` and returns the comment body.
///
/// With [`ReviewPolicy::PerFile`] up to `concurrency` model calls run at
/// once; sections keep the platform's file order regardless of completion
/// order.
pub async fn review_change_set(
    generator: &ReviewGenerator,
    changes: &ChangeSet,
    policy: ReviewPolicy,
    concurrency: usize,
) -> String {
    let t0 = Instant::now();

    let body = match policy {
        ReviewPolicy::WholeDiff => {
            let review = generator.review(&join_diffs(changes)).await;
            assemble_whole_diff(&review)
        }
        ReviewPolicy::PerFile => {
            let pending: Vec<_> = changes
                .files
                .iter()
                .map(|file| review_file(generator, file))
                .collect();
            let sections: Vec<(String, String)> = stream::iter(pending)
                .buffered(concurrency.max(1))
                .collect()
                .await;
            assemble_per_file(&sections)
        }
    };

    info!(
        %policy,
        files = changes.files.len(),
        ms = t0.elapsed().as_millis(),
        "review: body assembled"
    );
    body
}

/// Reviews one file; returns `(display path, review text)`.
async fn review_file(generator: &ReviewGenerator, file: &FileChange) -> (String, String) {
    let t = Instant::now();
    let path = file.display_path().to_string();
    let review = generator.review(&file.diff).await;
    debug!(path = %path, ms = t.elapsed().as_millis(), "review: file done");
    (path, review)
}
