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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use std::collections::LinkedList;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::UNIX_EPOCH;

use super::anomaly::IntegrityAnomaly;
use super::model::Operation;
use crate::util::util::StageTimings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounts {
    pub writes: u64,
    pub deletes: u64,
    pub optimizes: u64,
    pub vacuums: u64,
    pub merges: u64,
    pub other_operations: u64,
}

impl OperationCounts {
    pub fn record(&mut self, operation: Operation) {
        let counter = match operation {
            Operation::Write => &mut self.writes,
            Operation::Delete => &mut self.deletes,
            Operation::Optimize => &mut self.optimizes,
            Operation::Vacuum => &mut self.vacuums,
            Operation::Merge => &mut self.merges,
            Operation::Other => &mut self.other_operations,
        };
        *counter += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMetrics {
    pub commit_count: u64,
    /// `None` for an empty log, never zero
    pub latest_version: Option<u64>,
    pub latest_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkewMetrics {
    pub skewness_max: f64,
    pub skewness_average: f64,
    pub is_skewed: bool,
    pub partition_count: usize,
    pub record_count: u64,
    pub partition_columns: Vec<String>,
    pub largest_partition_records: u64,
    pub smallest_partition_records: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeMetrics {
    pub table_size_bytes: u64,
    pub folder_size_bytes: u64,
    /// Live files according to the log
    pub data_file_count: usize,
    /// Files found in storage
    pub total_file_count: usize,
    pub missing_files_count: usize,
    /// Orphan files a VACUUM would delete, 0 unless vacuum is recommended
    #[serde(default)]
    pub files_needing_vacuum: usize,
    pub storage_efficiency: Option<f64>,
    pub file_size_efficiency: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanMetrics {
    pub has_orphan_files: bool,
    pub orphan_file_paths: Vec<String>,
    pub orphan_bytes: u64,
    pub orphan_files_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallFileMetrics {
    pub small_files_count: usize,
    pub avg_file_size_bytes: u64,
}

/// Aggregated analyzer output. Serialized flat, one field per metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(flatten)]
    pub operations: OperationCounts,
    #[serde(flatten)]
    pub history: HistoryMetrics,
    #[serde(flatten)]
    pub skew: SkewMetrics,
    #[serde(flatten)]
    pub size: SizeMetrics,
    #[serde(flatten)]
    pub orphans: OrphanMetrics,
    #[serde(flatten)]
    pub small_files: SmallFileMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    VeryUnhealthy,
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Unhealthy => "UNHEALTHY",
            HealthStatus::VeryUnhealthy => "VERY UNHEALTHY",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedLikeMetrics {
    /// `(stage, start millis since epoch, duration millis)`
    pub duration_collection: LinkedList<(String, u128, u128)>,
}

impl From<&StageTimings<'_>> for TimedLikeMetrics {
    fn from(timings: &StageTimings<'_>) -> Self {
        let duration_collection = timings
            .iter()
            .map(|(name, start, dur)| {
                let start_ms = start
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or_default();
                (name.to_string(), start_ms, dur.as_millis())
            })
            .collect();
        Self {
            duration_collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub table_path: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub metrics: HealthMetrics,
    pub needs_vacuum: bool,
    pub needs_optimize: bool,
    /// 0.0 to 100.0
    pub health_score: f64,
    pub health_status: HealthStatus,
    pub recommendations: Vec<String>,
    pub anomalies: Vec<IntegrityAnomaly>,
    pub timed_metrics: TimedLikeMetrics,
}

fn format_bytes(bytes: u64) -> String {
    let bytes_f = bytes as f64;
    let gb = bytes_f / (1024.0 * 1024.0 * 1024.0);
    if gb >= 1.0 {
        return format!("{:.2} GB", gb);
    }
    let mb = bytes_f / (1024.0 * 1024.0);
    if mb >= 1.0 {
        format!("{:.2} MB", mb)
    } else {
        format!("{} B", bytes)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl Display for HealthReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let m = &self.metrics;

        writeln!(f, "\n{}", "━".repeat(80))?;
        writeln!(
            f,
            " {:<52} Score: {:>5.1} ({})",
            "Table Health Report", self.health_score, self.health_status
        )?;
        writeln!(f, "{}", "━".repeat(80))?;
        writeln!(f, " {}", self.table_path)?;
        writeln!(f, " {}", self.analysis_timestamp.to_rfc3339())?;
        writeln!(f, "{}", "━".repeat(80))?;

        writeln!(f)?;
        writeln!(f, " {:<41} {}", "History", "Storage")?;
        writeln!(f, "{}", "━".repeat(80))?;
        let version = m
            .history
            .latest_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let rows = [
            ("Commits", m.history.commit_count.to_string(), "Table Size", format_bytes(m.size.table_size_bytes)),
            ("Latest Version", version, "Folder Size", format_bytes(m.size.folder_size_bytes)),
            ("Writes", m.operations.writes.to_string(), "Live Files", m.size.data_file_count.to_string()),
            ("Deletes", m.operations.deletes.to_string(), "Stored Files", m.size.total_file_count.to_string()),
            ("Merges", m.operations.merges.to_string(), "Small Files", m.small_files.small_files_count.to_string()),
            ("Optimizes", m.operations.optimizes.to_string(), "Avg File Size", format_bytes(m.small_files.avg_file_size_bytes)),
            ("Vacuums", m.operations.vacuums.to_string(), "Orphan Files", m.orphans.orphan_files_count.to_string()),
            ("Other", m.operations.other_operations.to_string(), "Orphan Size", format_bytes(m.orphans.orphan_bytes)),
            ("", String::new(), "To Vacuum", m.size.files_needing_vacuum.to_string()),
        ];
        for (left, left_value, right, right_value) in rows.iter() {
            writeln!(
                f,
                " {:<19} {:>12}          {:<19} {:>12}",
                left, left_value, right, right_value
            )?;
        }

        writeln!(f)?;
        writeln!(f, " {}", "Partition Skew")?;
        writeln!(f, "{}", "━".repeat(80))?;
        writeln!(f, " {:<19} {:>12}", "Partitions", m.skew.partition_count)?;
        writeln!(f, " {:<19} {:>12}", "Records", m.skew.record_count)?;
        writeln!(f, " {:<19} {:>12.3}", "Skewness (max)", m.skew.skewness_max)?;
        writeln!(f, " {:<19} {:>12.3}", "Skewness (avg)", m.skew.skewness_average)?;
        writeln!(f, " {:<19} {:>12}", "Skewed", yes_no(m.skew.is_skewed))?;
        if !m.skew.partition_columns.is_empty() {
            writeln!(f, " {:<19} {}", "Columns", m.skew.partition_columns.join(", "))?;
        }

        writeln!(f)?;
        writeln!(
            f,
            " Needs vacuum: {}    Needs optimize: {}",
            yes_no(self.needs_vacuum),
            yes_no(self.needs_optimize)
        )?;

        if !self.anomalies.is_empty() {
            writeln!(f)?;
            writeln!(f, " Integrity Anomalies ({})", self.anomalies.len())?;
            writeln!(f, "{}", "━".repeat(80))?;
            for anomaly in &self.anomalies {
                writeln!(f, " - {}", anomaly)?;
            }
        }

        if !self.recommendations.is_empty() {
            writeln!(f)?;
            writeln!(f, " Recommendations")?;
            writeln!(f, "{}", "━".repeat(80))?;
            for (i, recommendation) in self.recommendations.iter().enumerate() {
                writeln!(f, " {}. {}", i + 1, recommendation)?;
            }
        }

        writeln!(f, "{}", "━".repeat(80))?;
        Ok(())
    }
}

impl HealthReport {
    /// Pretty JSON of the report. With `exclude_files` the orphan path list is
    /// emptied (the counts stay).
    pub fn to_json(&self, exclude_files: bool) -> Result<String, JsonError> {
        if exclude_files {
            let mut report = self.clone();
            report.metrics.orphans.orphan_file_paths = Vec::new();
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string_pretty(self)
        }
    }
}
