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

//! Partition skew over record counts.
//!
//! Each partition's deviation is `|count - mean| / mean`. The maximum and the
//! average deviation are reported and the table is skewed when the maximum
//! exceeds the configured threshold. This is a population deviation ratio,
//! not a statistical skewness coefficient, and must stay numerically stable
//! across releases.

use std::collections::BTreeSet;

use super::metrics::SkewMetrics;
use super::model::PartitionStats;

pub fn analyze_skew(partitions: &[PartitionStats], skew_threshold: f64) -> SkewMetrics {
    let counts: Vec<u64> = partitions.iter().map(|p| p.record_count).collect();
    let partition_columns: Vec<String> = partitions
        .iter()
        .flat_map(|p| p.partition_key.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut metrics = SkewMetrics {
        partition_count: counts.len(),
        record_count: counts.iter().sum(),
        partition_columns,
        largest_partition_records: counts.iter().copied().max().unwrap_or(0),
        smallest_partition_records: counts.iter().copied().min().unwrap_or(0),
        ..SkewMetrics::default()
    };

    if counts.len() <= 1 {
        return metrics;
    }

    let mean = metrics.record_count as f64 / counts.len() as f64;
    if mean == 0.0 {
        return metrics;
    }

    let deviations: Vec<f64> = counts
        .iter()
        .map(|&count| (count as f64 - mean).abs() / mean)
        .collect();
    metrics.skewness_max = deviations.iter().copied().fold(0.0, f64::max);
    metrics.skewness_average = deviations.iter().sum::<f64>() / deviations.len() as f64;
    metrics.is_skewed = metrics.skewness_max > skew_threshold;
    metrics
}
