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

use super::metrics::OrphanMetrics;
use super::model::PhysicalFile;
use super::reconcile::LiveFiles;

/// Physical files not referenced by any live log entry.
///
/// Paths are returned sorted. Nothing is ever deleted here.
pub fn detect_orphans(live_files: &LiveFiles, physical_files: &[PhysicalFile]) -> OrphanMetrics {
    let mut orphans: Vec<&PhysicalFile> = physical_files
        .iter()
        .filter(|file| !live_files.contains_key(&file.path))
        .collect();
    orphans.sort_by(|a, b| a.path.cmp(&b.path));

    let orphan_bytes = orphans.iter().map(|file| file.size_bytes).sum();
    OrphanMetrics {
        has_orphan_files: !orphans.is_empty(),
        orphan_files_count: orphans.len(),
        orphan_file_paths: orphans.into_iter().map(|file| file.path.clone()).collect(),
        orphan_bytes,
    }
}
