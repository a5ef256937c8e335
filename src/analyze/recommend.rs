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

//! Threshold policies turning metrics into maintenance advice.
//!
//! Everything here is advisory. Nothing in the crate acts on these flags.

use super::anomaly::IntegrityAnomaly;
use super::common::scoring::{calculate_health_score, health_status};
use super::config::AnalysisConfig;
use super::metrics::{HealthMetrics, HealthStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub needs_vacuum: bool,
    pub needs_optimize: bool,
    pub health_score: f64,
    pub health_status: HealthStatus,
    pub recommendations: Vec<String>,
}

pub fn needs_vacuum(metrics: &HealthMetrics, config: &AnalysisConfig) -> bool {
    let orphans = &metrics.orphans;
    if !orphans.has_orphan_files || orphans.orphan_bytes <= config.orphan_byte_threshold {
        return false;
    }
    match config.orphan_ratio_threshold {
        None => true,
        Some(threshold) => {
            let folder = metrics.size.folder_size_bytes;
            folder > 0 && orphans.orphan_bytes as f64 / folder as f64 > threshold
        }
    }
}

pub fn needs_optimize(metrics: &HealthMetrics, config: &AnalysisConfig) -> bool {
    metrics.skew.is_skewed
        || metrics.small_files.small_files_count > config.small_file_count_threshold
}

pub fn recommend(
    metrics: &HealthMetrics,
    anomalies: &[IntegrityAnomaly],
    config: &AnalysisConfig,
) -> Recommendation {
    let needs_vacuum = needs_vacuum(metrics, config);
    let needs_optimize = needs_optimize(metrics, config);
    let health_score = calculate_health_score(metrics, needs_vacuum);

    let mut recommendations = Vec::new();
    if needs_vacuum {
        recommendations.push(format!(
            "Found {} orphan files ({} bytes) not referenced by the transaction log. Consider running VACUUM.",
            metrics.orphans.orphan_files_count, metrics.orphans.orphan_bytes
        ));
    }
    if metrics.small_files.small_files_count > config.small_file_count_threshold {
        recommendations.push(format!(
            "Found {} files smaller than {} bytes. Consider running OPTIMIZE to compact them.",
            metrics.small_files.small_files_count, config.small_file_threshold_bytes
        ));
    }
    if metrics.skew.is_skewed {
        recommendations.push(format!(
            "Partition skew detected (max deviation {:.2}). Consider repartitioning to balance data distribution.",
            metrics.skew.skewness_max
        ));
    }
    if !anomalies.is_empty() {
        recommendations.push(format!(
            "Found {} transaction log integrity anomalies. Investigate the log and storage for consistency.",
            anomalies.len()
        ));
    }

    Recommendation {
        needs_vacuum,
        needs_optimize,
        health_score,
        health_status: health_status(health_score),
        recommendations,
    }
}
