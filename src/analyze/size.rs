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

use std::collections::HashMap;
use tracing::warn;

use super::anomaly::IntegrityAnomaly;
use super::common::constants::TARGET_FILE_SIZE_BYTES;
use super::metrics::{SizeMetrics, SmallFileMetrics};
use super::model::PhysicalFile;
use super::reconcile::LiveFiles;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeAggregation {
    pub size: SizeMetrics,
    pub small_files: SmallFileMetrics,
    /// Sorted by path
    pub missing_files: Vec<IntegrityAnomaly>,
}

/// Compare the live file set with the storage listing.
///
/// Live files are sized from the listing. A live file the listing lacks is a
/// missing-file anomaly and contributes its log-recorded size instead, so
/// `table_size_bytes <= folder_size_bytes` only holds without such anomalies.
pub fn aggregate_sizes(
    live_files: &LiveFiles,
    physical_files: &[PhysicalFile],
    small_file_threshold_bytes: u64,
) -> SizeAggregation {
    let physical_sizes: HashMap<&str, u64> = physical_files
        .iter()
        .map(|file| (file.path.as_str(), file.size_bytes))
        .collect();
    let folder_size_bytes: u64 = physical_files.iter().map(|file| file.size_bytes).sum();

    let mut table_size_bytes = 0u64;
    let mut small_files_count = 0usize;
    let mut missing_files = Vec::new();

    for file in live_files.values() {
        let size = match physical_sizes.get(file.path.as_str()) {
            Some(&size) => size,
            None => {
                warn!(
                    "Live file missing from storage, path={}, log_size_bytes={}",
                    file.path, file.size_bytes
                );
                missing_files.push((file.path.clone(), file.size_bytes));
                file.size_bytes
            }
        };
        table_size_bytes += size;
        if size < small_file_threshold_bytes {
            small_files_count += 1;
        }
    }
    missing_files.sort();
    let missing_files: Vec<IntegrityAnomaly> = missing_files
        .into_iter()
        .map(|(path, log_size_bytes)| IntegrityAnomaly::MissingFile {
            path,
            log_size_bytes,
        })
        .collect();

    let data_file_count = live_files.len();
    let avg_file_size_bytes = if data_file_count == 0 {
        0
    } else {
        table_size_bytes / data_file_count as u64
    };
    let storage_efficiency =
        (folder_size_bytes > 0).then(|| table_size_bytes as f64 / folder_size_bytes as f64);
    let file_size_efficiency = (data_file_count > 0)
        .then(|| (avg_file_size_bytes as f64 / TARGET_FILE_SIZE_BYTES as f64).min(1.0));

    SizeAggregation {
        size: SizeMetrics {
            table_size_bytes,
            folder_size_bytes,
            data_file_count,
            total_file_count: physical_files.len(),
            missing_files_count: missing_files.len(),
            files_needing_vacuum: 0,
            storage_efficiency,
            file_size_efficiency,
        },
        small_files: SmallFileMetrics {
            small_files_count,
            avg_file_size_bytes,
        },
        missing_files,
    }
}
