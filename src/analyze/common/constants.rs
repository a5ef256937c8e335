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

//! Default thresholds and scoring parameters shared by the analyzers.

/// Partitions deviating from the mean by more than this fraction mark the table as skewed.
/// Default: 0.5
pub const DEFAULT_SKEW_THRESHOLD: f64 = 0.5;

/// Live files strictly smaller than this are "small".
/// Default: 1 MiB
pub const DEFAULT_SMALL_FILE_THRESHOLD_BYTES: u64 = 1024 * 1024;

/// More small files than this triggers a compaction recommendation.
pub const DEFAULT_SMALL_FILE_COUNT_THRESHOLD: usize = 10;

/// Orphan bytes must exceed this before a vacuum is recommended.
pub const DEFAULT_ORPHAN_BYTE_THRESHOLD: u64 = 0;

/// Ideal data file size used for the file size efficiency ratio.
/// Default: 128 MiB
pub const TARGET_FILE_SIZE_BYTES: u64 = 128 * 1024 * 1024;

/// Maximum points of each of the four health score components.
pub const SCORE_COMPONENT_MAX: f64 = 25.0;

/// Writes needed for full data freshness points.
pub const FRESHNESS_FULL_WRITES: f64 = 10.0;

/// Score at or above which a table is healthy.
pub const HEALTHY_SCORE: f64 = 80.0;

/// Score at or above which a table is unhealthy rather than very unhealthy.
pub const UNHEALTHY_SCORE: f64 = 50.0;
