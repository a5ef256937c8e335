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

//! Composite health score.
//!
//! Four components worth up to 25 points each are summed into a 0-100 score:
//! data freshness, maintenance, data balance and storage efficiency.

use super::constants::*;
use crate::analyze::metrics::{HealthMetrics, HealthStatus};

const HALF_COMPONENT: f64 = SCORE_COMPONENT_MAX / 2.0;

/// Full points once the table has seen [`FRESHNESS_FULL_WRITES`] writes.
pub fn freshness_score(writes: u64) -> f64 {
    (writes as f64 / FRESHNESS_FULL_WRITES * SCORE_COMPONENT_MAX).min(SCORE_COMPONENT_MAX)
}

/// Half for optimizing regularly relative to writes, half for not needing a vacuum.
pub fn maintenance_score(optimizes: u64, writes: u64, needs_vacuum: bool) -> f64 {
    let optimize_ratio = optimizes as f64 / writes.max(1) as f64;
    let optimize_points = (optimize_ratio * 10.0 * HALF_COMPONENT).min(HALF_COMPONENT);
    let vacuum_points = if needs_vacuum { 0.0 } else { HALF_COMPONENT };
    optimize_points + vacuum_points
}

/// Full points without skew, zero from a max deviation of 0.25 upwards.
pub fn balance_score(skewness_max: f64) -> f64 {
    SCORE_COMPONENT_MAX - (skewness_max * 100.0).min(SCORE_COMPONENT_MAX)
}

/// Penalizes small files relative to write volume and the presence of orphans.
pub fn storage_score(small_files_count: usize, writes: u64, has_orphan_files: bool) -> f64 {
    let small_file_ratio = small_files_count as f64 / (writes * 2).max(1) as f64;
    let small_file_penalty = (small_file_ratio * HALF_COMPONENT).min(HALF_COMPONENT);
    let orphan_penalty = if has_orphan_files { HALF_COMPONENT } else { 0.0 };
    SCORE_COMPONENT_MAX - small_file_penalty - orphan_penalty
}

/// Sum of the four components, between 0 and 100.
pub fn calculate_health_score(metrics: &HealthMetrics, needs_vacuum: bool) -> f64 {
    let ops = &metrics.operations;
    freshness_score(ops.writes)
        + maintenance_score(ops.optimizes, ops.writes, needs_vacuum)
        + balance_score(metrics.skew.skewness_max)
        + storage_score(
            metrics.small_files.small_files_count,
            ops.writes,
            metrics.orphans.has_orphan_files,
        )
}

pub fn health_status(score: f64) -> HealthStatus {
    if score >= HEALTHY_SCORE {
        HealthStatus::Healthy
    } else if score >= UNHEALTHY_SCORE {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::VeryUnhealthy
    }
}
