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

//! Input records handed to the analysis pipeline by the collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Partition column -> value. `None` is a null partition value.
pub type PartitionValues = BTreeMap<String, Option<String>>;

/// Kind of operation recorded by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Write,
    Delete,
    Optimize,
    Vacuum,
    Merge,
    Other,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Write => "WRITE",
            Operation::Delete => "DELETE",
            Operation::Optimize => "OPTIMIZE",
            Operation::Vacuum => "VACUUM",
            Operation::Merge => "MERGE",
            Operation::Other => "OTHER",
        };
        f.write_str(name)
    }
}

/// A data file referenced by an add or remove action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    /// Path relative to the table root
    pub path: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub partition_values: PartitionValues,
    /// Row count from the file statistics, when the writer recorded them
    #[serde(default)]
    pub num_records: Option<u64>,
}

impl FileRef {
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            partition_values: PartitionValues::new(),
            num_records: None,
        }
    }

    pub fn with_partition(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.partition_values
            .insert(column.into(), value.map(str::to_string));
        self
    }

    pub fn with_num_records(mut self, num_records: u64) -> Self {
        self.num_records = Some(num_records);
        self
    }
}

/// One entry of the transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub version: u64,
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    #[serde(default)]
    pub added_files: Vec<FileRef>,
    #[serde(default)]
    pub removed_files: Vec<FileRef>,
    #[serde(default)]
    pub operation_metrics: Option<HashMap<String, f64>>,
}

impl CommitRecord {
    pub fn new(version: u64, timestamp: DateTime<Utc>, operation: Operation) -> Self {
        Self {
            version,
            timestamp,
            operation,
            added_files: Vec::new(),
            removed_files: Vec::new(),
            operation_metrics: None,
        }
    }

    pub fn with_added(mut self, files: impl IntoIterator<Item = FileRef>) -> Self {
        self.added_files.extend(files);
        self
    }

    pub fn with_removed(mut self, files: impl IntoIterator<Item = FileRef>) -> Self {
        self.removed_files.extend(files);
        self
    }
}

/// Table state materialized at `version`: the files live after that commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u64,
    pub live_files: Vec<FileRef>,
}

/// Everything a log reader knows about a table: the latest checkpoint, if
/// any, and the retained commits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    #[serde(default)]
    pub checkpoint: Option<Checkpoint>,
    pub commits: Vec<CommitRecord>,
}

impl LogSnapshot {
    pub fn from_commits(commits: Vec<CommitRecord>) -> Self {
        Self {
            checkpoint: None,
            commits,
        }
    }
}

/// A file actually present in storage under the table directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalFile {
    pub path: String,
    pub size_bytes: u64,
}

impl PhysicalFile {
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }
}

/// Record count for one distinct partition-value combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub partition_key: PartitionValues,
    pub record_count: u64,
}

impl PartitionStats {
    pub fn new(partition_key: PartitionValues, record_count: u64) -> Self {
        Self {
            partition_key,
            record_count,
        }
    }

    /// Convenience for an unpartitioned table or tests that only care about counts.
    pub fn unkeyed(record_count: u64) -> Self {
        Self::new(PartitionValues::new(), record_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ref_builders() {
        let file = FileRef::new("day=Mon/part-0.parquet", 100)
            .with_partition("day", Some("Mon"))
            .with_partition("region", None)
            .with_num_records(42);
        assert_eq!(file.partition_values.len(), 2);
        assert_eq!(file.partition_values.get("region"), Some(&None));
        assert_eq!(file.num_records, Some(42));
    }

    #[test]
    fn test_operation_serialization() {
        assert_eq!(
            serde_json::to_string(&Operation::Optimize).unwrap(),
            "\"optimize\""
        );
        assert_eq!(Operation::Vacuum.to_string(), "VACUUM");
    }

    #[test]
    fn test_commit_record_deserialize_defaults() {
        let record: CommitRecord = serde_json::from_str(
            r#"{"version": 3, "timestamp": "2024-01-01T00:00:00Z", "operation": "merge"}"#,
        )
        .unwrap();
        assert_eq!(record.version, 3);
        assert_eq!(record.operation, Operation::Merge);
        assert!(record.added_files.is_empty());
        assert!(record.operation_metrics.is_none());
    }
}
