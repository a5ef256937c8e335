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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal inconsistency found while analyzing. Collected onto the report,
/// never aborts the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityAnomaly {
    /// A path was added while an earlier add of the same path was still live.
    DuplicateLiveAdd { path: String, version: u64 },
    /// A remove action referenced a path that was not live.
    RemovedUnknownFile { path: String, version: u64 },
    /// A live file is absent from the storage listing.
    MissingFile { path: String, log_size_bytes: u64 },
    /// Commit versions skipped from `expected` to `found`.
    VersionGap { expected: u64, found: u64 },
    /// The log starts after version 0 and no checkpoint covers the earlier
    /// commits, so the live set is incomplete.
    TruncatedLog { first_version: u64 },
}

impl fmt::Display for IntegrityAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityAnomaly::DuplicateLiveAdd { path, version } => {
                write!(f, "duplicate live add of {} at version {}", path, version)
            }
            IntegrityAnomaly::RemovedUnknownFile { path, version } => {
                write!(f, "remove of unknown file {} at version {}", path, version)
            }
            IntegrityAnomaly::MissingFile {
                path,
                log_size_bytes,
            } => write!(
                f,
                "live file {} ({} bytes in log) missing from storage",
                path, log_size_bytes
            ),
            IntegrityAnomaly::VersionGap { expected, found } => {
                write!(f, "version gap, expected {} found {}", expected, found)
            }
            IntegrityAnomaly::TruncatedLog { first_version } => write!(
                f,
                "log starts at version {} without a checkpoint, orphan check skipped",
                first_version
            ),
        }
    }
}
