// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Replays the transaction log into operation counts and the live file set.

use std::collections::HashMap;
use tracing::{info, warn};

use super::anomaly::IntegrityAnomaly;
use super::metrics::{HistoryMetrics, OperationCounts};
use super::model::{Checkpoint, CommitRecord, FileRef, LogSnapshot};

/// Live files keyed by their table-relative path.
pub type LiveFiles = HashMap<String, FileRef>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciledLog {
    pub operations: OperationCounts,
    pub history: HistoryMetrics,
    pub live_files: LiveFiles,
    pub anomalies: Vec<IntegrityAnomaly>,
    /// Early commits are gone and no checkpoint replaces them; files added
    /// there are absent from `live_files`.
    pub truncated: bool,
}

/// Fold the commits, in ascending version order, into the current table state.
///
/// Within a commit the removals are applied before the additions, so a file
/// rewritten in place by one commit stays live. Commits with equal versions
/// keep their input order.
pub fn reconcile(commits: &[CommitRecord]) -> ReconciledLog {
    reconcile_from(None, commits)
}

/// [`reconcile`] over everything a log reader returned.
pub fn reconcile_snapshot(snapshot: &LogSnapshot) -> ReconciledLog {
    reconcile_from(snapshot.checkpoint.as_ref(), &snapshot.commits)
}

/// Fold the commits on top of a checkpoint.
///
/// The checkpoint seeds the live set. Commits at or below its version still
/// count towards operations and history but no longer touch the live set.
pub fn reconcile_from(checkpoint: Option<&Checkpoint>, commits: &[CommitRecord]) -> ReconciledLog {
    let mut ordered: Vec<&CommitRecord> = commits.iter().collect();
    ordered.sort_by_key(|commit| commit.version);

    let mut result = ReconciledLog::default();
    let checkpoint_version = checkpoint.map(|c| c.version);
    if let Some(checkpoint) = checkpoint {
        result.live_files.extend(
            checkpoint
                .live_files
                .iter()
                .map(|file| (file.path.clone(), file.clone())),
        );
        result.history.latest_version = Some(checkpoint.version);
        info!(
            "Seeded live files from checkpoint, version={}, live_files={}",
            checkpoint.version,
            result.live_files.len()
        );
    } else if let Some(first) = ordered.first().filter(|commit| commit.version > 0) {
        warn!(
            "Transaction log starts without checkpoint, first_version={}",
            first.version
        );
        result.truncated = true;
        result.anomalies.push(IntegrityAnomaly::TruncatedLog {
            first_version: first.version,
        });
    }

    let mut previous_version: Option<u64> = None;

    for commit in ordered {
        let covered = checkpoint_version.is_some_and(|v| commit.version <= v);
        if let Some(v) = checkpoint_version.filter(|_| !covered) {
            previous_version = Some(previous_version.map_or(v, |prev| prev.max(v)));
        }
        if let Some(prev) = previous_version {
            if commit.version > prev + 1 {
                warn!(
                    "Version gap in transaction log, expected={}, found={}",
                    prev + 1,
                    commit.version
                );
                result.anomalies.push(IntegrityAnomaly::VersionGap {
                    expected: prev + 1,
                    found: commit.version,
                });
            }
        }
        previous_version = Some(commit.version);

        result.operations.record(commit.operation);
        result.history.commit_count += 1;
        result.history.latest_version = result.history.latest_version.max(Some(commit.version));
        result.history.latest_timestamp = Some(commit.timestamp);

        if covered {
            continue;
        }

        for removed in &commit.removed_files {
            if result.live_files.remove(&removed.path).is_none() {
                warn!(
                    "Remove of unknown file, path={}, version={}",
                    removed.path, commit.version
                );
                result.anomalies.push(IntegrityAnomaly::RemovedUnknownFile {
                    path: removed.path.clone(),
                    version: commit.version,
                });
            }
        }

        for added in &commit.added_files {
            if result
                .live_files
                .insert(added.path.clone(), added.clone())
                .is_some()
            {
                warn!(
                    "Duplicate live add, path={}, version={}",
                    added.path, commit.version
                );
                result.anomalies.push(IntegrityAnomaly::DuplicateLiveAdd {
                    path: added.path.clone(),
                    version: commit.version,
                });
            }
        }
    }

    result
}
