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

//! Delta transaction log reader.
//!
//! Every `_delta_log/<version>.json` commit file is newline-delimited JSON with
//! one action per line. Only `add`, `remove` and `commitInfo` actions matter
//! here; everything else (`protocol`, `metaData`, `txn`, ...) is skipped.
//!
//! Paths in add and remove actions are URI-encoded (`city=New%20York/...`)
//! and are decoded to the form the storage listing reports.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::analyze::error::LogReadError;
use crate::analyze::model::{
    Checkpoint, CommitRecord, FileRef, LogSnapshot, Operation, PartitionValues,
};
use crate::reader::LogReader;
use crate::storage::{FileMetadata, StorageProvider};
use crate::util::util::join_path;

use super::checkpoint::{latest_complete_checkpoint, parse_checkpoint};

pub const DELTA_LOG_DIR: &str = "_delta_log";

const VERSION_DIGITS: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogAction {
    add: Option<AddAction>,
    remove: Option<RemoveAction>,
    commit_info: Option<CommitInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddAction {
    path: String,
    size: u64,
    #[serde(default)]
    partition_values: PartitionValues,
    /// JSON-encoded file statistics
    stats: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveAction {
    path: String,
    size: Option<u64>,
    #[serde(default)]
    partition_values: Option<PartitionValues>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitInfo {
    /// Milliseconds since the epoch
    timestamp: Option<i64>,
    operation: Option<String>,
    operation_metrics: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileStats {
    num_records: Option<u64>,
}

/// Map a `commitInfo.operation` name onto [`Operation`].
pub fn parse_operation(name: &str) -> Operation {
    match name.trim().to_uppercase().as_str() {
        "WRITE"
        | "CREATE TABLE AS SELECT"
        | "REPLACE TABLE AS SELECT"
        | "CREATE OR REPLACE TABLE AS SELECT"
        | "STREAMING UPDATE" => Operation::Write,
        "DELETE" => Operation::Delete,
        "OPTIMIZE" => Operation::Optimize,
        "VACUUM END" => Operation::Vacuum,
        "MERGE" => Operation::Merge,
        _ => Operation::Other,
    }
}

/// Version of a commit file, `None` for anything else in `_delta_log`
/// (checkpoints, checksums, `_last_checkpoint`, temporary files).
pub fn commit_version(path: &str) -> Option<u64> {
    let name = path.rsplit('/').next()?;
    let digits = name.strip_suffix(".json")?;
    if digits.len() != VERSION_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn metric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode a URI-encoded action path.
pub(crate) fn decode_path(table_path: &str, path: &str) -> Result<String, LogReadError> {
    percent_decode_str(path)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            LogReadError::new(table_path, format!("path {} is not valid UTF-8 once decoded", path))
                .with_source(e)
        })
}

pub(crate) fn num_records(stats: Option<&str>, path: &str) -> Option<u64> {
    let stats = stats?;
    match serde_json::from_str::<FileStats>(stats) {
        Ok(parsed) => parsed.num_records,
        Err(e) => {
            debug!("Ignoring unparsable stats, path={}, error={}", path, e);
            None
        }
    }
}

/// Parse one commit file into a [`CommitRecord`].
///
/// `fallback_timestamp` is used when the commit carries no `commitInfo.timestamp`.
pub fn parse_commit(
    table_path: &str,
    version: u64,
    content: &[u8],
    fallback_timestamp: Option<DateTime<Utc>>,
) -> Result<CommitRecord, LogReadError> {
    let text = std::str::from_utf8(content).map_err(|e| {
        LogReadError::new(table_path, format!("commit {} is not valid UTF-8", version))
            .with_source(e)
    })?;

    let mut record = CommitRecord::new(
        version,
        fallback_timestamp.unwrap_or_default(),
        Operation::Other,
    );

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let action: LogAction = serde_json::from_str(line).map_err(|e| {
            LogReadError::new(
                table_path,
                format!("invalid action in commit {} line {}", version, line_no + 1),
            )
            .with_source(e)
        })?;

        if let Some(add) = action.add {
            let path = decode_path(table_path, &add.path)?;
            record.added_files.push(FileRef {
                num_records: num_records(add.stats.as_deref(), &path),
                path,
                size_bytes: add.size,
                partition_values: add.partition_values,
            });
        }
        if let Some(remove) = action.remove {
            record.removed_files.push(FileRef {
                path: decode_path(table_path, &remove.path)?,
                size_bytes: remove.size.unwrap_or(0),
                partition_values: remove.partition_values.unwrap_or_default(),
                num_records: None,
            });
        }
        if let Some(info) = action.commit_info {
            if let Some(operation) = info.operation.as_deref() {
                record.operation = parse_operation(operation);
            }
            if let Some(ts) = info
                .timestamp
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            {
                record.timestamp = ts;
            }
            record.operation_metrics = info.operation_metrics.map(|metrics| {
                metrics
                    .iter()
                    .filter_map(|(k, v)| metric_value(v).map(|n| (k.clone(), n)))
                    .collect()
            });
        }
    }

    Ok(record)
}

/// Reads the Delta transaction log through a [`StorageProvider`].
pub struct DeltaLogReader {
    storage_provider: Arc<dyn StorageProvider>,
    parallelism: usize,
}

impl DeltaLogReader {
    pub fn new(storage_provider: Arc<dyn StorageProvider>, parallelism: usize) -> Self {
        Self {
            storage_provider,
            parallelism: parallelism.max(1),
        }
    }

    async fn read_single_commit(
        storage_provider: Arc<dyn StorageProvider>,
        table_path: String,
        version: u64,
        file: FileMetadata,
    ) -> Result<CommitRecord, LogReadError> {
        let content = storage_provider.read_file(&file.path).await.map_err(|e| {
            LogReadError::new(&table_path, format!("failed to read {}", file.path)).with_source(e)
        })?;
        let record = parse_commit(&table_path, version, &content, file.last_modified)?;
        debug!(
            "Read commit, version={}, operation={}, adds={}, removes={}",
            version,
            record.operation,
            record.added_files.len(),
            record.removed_files.len()
        );
        Ok(record)
    }

    async fn list_log(&self, table_path: &str) -> Result<Vec<FileMetadata>, LogReadError> {
        let log_dir = join_path(table_path, DELTA_LOG_DIR);
        self.storage_provider
            .list_files(&log_dir, false)
            .await
            .map_err(|e| {
                LogReadError::new(table_path, format!("failed to list {}", log_dir)).with_source(e)
            })
    }

    async fn read_commits(
        &self,
        table_path: &str,
        log_files: &[FileMetadata],
    ) -> Result<Vec<CommitRecord>, LogReadError> {
        let commit_files: Vec<(u64, FileMetadata)> = log_files
            .iter()
            .filter_map(|file| commit_version(&file.path).map(|version| (version, file.clone())))
            .collect();

        let results: Vec<Result<CommitRecord, LogReadError>> = stream::iter(commit_files)
            .map(|(version, file)| {
                Self::read_single_commit(
                    Arc::clone(&self.storage_provider),
                    table_path.to_string(),
                    version,
                    file,
                )
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut commits = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        commits.sort_by_key(|commit| commit.version);
        Ok(commits)
    }

    async fn read_checkpoint(
        &self,
        table_path: &str,
        log_files: &[FileMetadata],
    ) -> Result<Option<Checkpoint>, LogReadError> {
        let Some((version, parts)) = latest_complete_checkpoint(log_files) else {
            return Ok(None);
        };

        let contents: Vec<Result<Vec<FileRef>, LogReadError>> = stream::iter(parts)
            .map(|part| async move {
                let content = self.storage_provider.read_file(&part.path).await.map_err(|e| {
                    LogReadError::new(table_path, format!("failed to read {}", part.path))
                        .with_source(e)
                })?;
                parse_checkpoint(table_path, content)
            })
            .buffered(self.parallelism)
            .collect()
            .await;

        let mut live_files = Vec::new();
        for files in contents {
            live_files.extend(files?);
        }
        debug!(
            "Read checkpoint, version={}, live_files={}",
            version,
            live_files.len()
        );
        Ok(Some(Checkpoint {
            version,
            live_files,
        }))
    }
}

#[async_trait]
impl LogReader for DeltaLogReader {
    async fn read_commit_log(&self, table_path: &str) -> Result<Vec<CommitRecord>, LogReadError> {
        let start = SystemTime::now();
        let log_files = self.list_log(table_path).await?;
        let commits = self.read_commits(table_path, &log_files).await?;
        if commits.is_empty() {
            return Err(LogReadError::new(
                table_path,
                format!("no commit files found in {}", join_path(table_path, DELTA_LOG_DIR)),
            ));
        }

        info!(
            "Read transaction log, table_path={}, commits={}, parallelism={}, took={}",
            table_path,
            commits.len(),
            self.parallelism,
            start.elapsed().unwrap_or_default().as_millis()
        );
        Ok(commits)
    }

    async fn read_log_snapshot(&self, table_path: &str) -> Result<LogSnapshot, LogReadError> {
        let start = SystemTime::now();
        let log_files = self.list_log(table_path).await?;
        let (checkpoint, commits) = tokio::try_join!(
            self.read_checkpoint(table_path, &log_files),
            self.read_commits(table_path, &log_files),
        )?;
        if checkpoint.is_none() && commits.is_empty() {
            return Err(LogReadError::new(
                table_path,
                format!("no commit files found in {}", join_path(table_path, DELTA_LOG_DIR)),
            ));
        }

        info!(
            "Read transaction log, table_path={}, checkpoint_version={:?}, commits={}, parallelism={}, took={}",
            table_path,
            checkpoint.as_ref().map(|c| c.version),
            commits.len(),
            self.parallelism,
            start.elapsed().unwrap_or_default().as_millis()
        );
        Ok(LogSnapshot {
            checkpoint,
            commits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::delta::checkpoint::tests as checkpoint_tests;
    use crate::storage::{StorageConfig, StorageProviderFactory};
    use std::fs;
    use tempfile::TempDir;

    const COMMIT_0: &str = r#"{"protocol":{"minReaderVersion":1,"minWriterVersion":2}}
{"metaData":{"id":"abc","partitionColumns":["day"]}}
{"add":{"path":"day=Mon/part-0.parquet","size":100,"partitionValues":{"day":"Mon"},"dataChange":true,"stats":"{\"numRecords\":10}"}}
{"add":{"path":"day=Tue/part-1.parquet","size":200,"partitionValues":{"day":"Tue"},"dataChange":true}}
{"commitInfo":{"timestamp":1700000000000,"operation":"WRITE","operationMetrics":{"numFiles":"2","numOutputBytes":300}}}
"#;

    const COMMIT_1: &str = r#"{"remove":{"path":"day=Tue/part-1.parquet","deletionTimestamp":1700000001000,"dataChange":true,"size":200}}
{"commitInfo":{"timestamp":1700000001000,"operation":"DELETE"}}
"#;

    fn write(dir: &TempDir, relative: &str, contents: &str) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    async fn reader(dir: &TempDir) -> DeltaLogReader {
        let config = StorageConfig::local().with_option("path", dir.path().to_string_lossy());
        let provider = StorageProviderFactory::from_config(config).await.unwrap();
        DeltaLogReader::new(provider, 4)
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!(parse_operation("WRITE"), Operation::Write);
        assert_eq!(parse_operation("CREATE TABLE AS SELECT"), Operation::Write);
        assert_eq!(parse_operation("STREAMING UPDATE"), Operation::Write);
        assert_eq!(parse_operation("DELETE"), Operation::Delete);
        assert_eq!(parse_operation("OPTIMIZE"), Operation::Optimize);
        assert_eq!(parse_operation("VACUUM END"), Operation::Vacuum);
        assert_eq!(parse_operation("VACUUM START"), Operation::Other);
        assert_eq!(parse_operation("MERGE"), Operation::Merge);
        assert_eq!(parse_operation("SET TBLPROPERTIES"), Operation::Other);
    }

    #[test]
    fn test_commit_version() {
        assert_eq!(commit_version("t/_delta_log/00000000000000000012.json"), Some(12));
        assert_eq!(commit_version("00000000000000000000.json"), Some(0));
        assert_eq!(
            commit_version("t/_delta_log/00000000000000000010.checkpoint.parquet"),
            None
        );
        assert_eq!(commit_version("t/_delta_log/00000000000000000010.crc"), None);
        assert_eq!(commit_version("t/_delta_log/_last_checkpoint"), None);
        assert_eq!(commit_version("t/_delta_log/12.json"), None);
    }

    #[test]
    fn test_parse_commit() {
        let record = parse_commit("t", 0, COMMIT_0.as_bytes(), None).unwrap();
        assert_eq!(record.version, 0);
        assert_eq!(record.operation, Operation::Write);
        assert_eq!(record.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(record.added_files.len(), 2);
        assert_eq!(record.added_files[0].num_records, Some(10));
        assert_eq!(record.added_files[1].num_records, None);
        assert_eq!(
            record.added_files[0].partition_values.get("day"),
            Some(&Some("Mon".to_string()))
        );
        let metrics = record.operation_metrics.unwrap();
        assert_eq!(metrics.get("numFiles"), Some(&2.0));
        assert_eq!(metrics.get("numOutputBytes"), Some(&300.0));
    }

    #[test]
    fn test_parse_commit_without_commit_info_uses_fallback() {
        let fallback = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let content = r#"{"add":{"path":"a.parquet","size":1}}"#;
        let record = parse_commit("t", 3, content.as_bytes(), Some(fallback)).unwrap();
        assert_eq!(record.timestamp, fallback);
        assert_eq!(record.operation, Operation::Other);
    }

    #[test]
    fn test_parse_commit_rejects_garbage() {
        let err = parse_commit("t", 5, b"{not json", None).unwrap_err();
        assert!(err.to_string().contains("invalid action in commit 5 line 1"));
    }

    #[tokio::test]
    async fn test_read_commit_log_from_disk() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/_delta_log/00000000000000000000.json", COMMIT_0);
        write(&dir, "sales/_delta_log/00000000000000000001.json", COMMIT_1);
        write(&dir, "sales/_delta_log/00000000000000000001.crc", "{}");
        write(&dir, "sales/_delta_log/_last_checkpoint", "{}");

        let commits = reader(&dir).await.read_commit_log("sales").await.unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].version, 0);
        assert_eq!(commits[1].version, 1);
        assert_eq!(commits[1].operation, Operation::Delete);
        assert_eq!(commits[1].removed_files[0].size_bytes, 200);
    }

    #[tokio::test]
    async fn test_read_commit_log_without_commits_fails() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/part-0.parquet", "x");

        let err = reader(&dir)
            .await
            .read_commit_log("sales")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no commit files"));
    }

    #[tokio::test]
    async fn test_read_commit_log_corrupt_commit_fails() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/_delta_log/00000000000000000000.json", COMMIT_0);
        write(&dir, "sales/_delta_log/00000000000000000001.json", "oops\n");

        let err = reader(&dir)
            .await
            .read_commit_log("sales")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("commit 1"));
    }

    #[test]
    fn test_parse_commit_decodes_paths() {
        let content = r#"{"add":{"path":"city=New%20York/part-0.parquet","size":100,"partitionValues":{"city":"New York"}}}
{"remove":{"path":"city=S%C3%A3o%20Paulo/part-1.parquet","size":5}}
"#;
        let record = parse_commit("t", 0, content.as_bytes(), None).unwrap();
        assert_eq!(record.added_files[0].path, "city=New York/part-0.parquet");
        assert_eq!(record.removed_files[0].path, "city=S\u{e3}o Paulo/part-1.parquet");
    }

    #[test]
    fn test_parse_commit_rejects_undecodable_path() {
        let content = r#"{"add":{"path":"bad%FF.parquet","size":1}}"#;
        let err = parse_commit("t", 0, content.as_bytes(), None).unwrap_err();
        assert!(err.to_string().contains("bad%FF.parquet"));
    }

    #[tokio::test]
    async fn test_snapshot_without_checkpoint() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/_delta_log/00000000000000000000.json", COMMIT_0);
        write(&dir, "sales/_delta_log/00000000000000000001.json", COMMIT_1);

        let snapshot = reader(&dir).await.read_log_snapshot("sales").await.unwrap();
        assert!(snapshot.checkpoint.is_none());
        assert_eq!(snapshot.commits.len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_reads_latest_checkpoint() {
        let dir = TempDir::new().unwrap();
        // commits 0 and 1 were cleaned up after checkpoint 2
        write(&dir, "sales/_delta_log/00000000000000000002.json", COMMIT_0);
        write(&dir, "sales/_delta_log/00000000000000000003.json", COMMIT_1);
        let checkpoint_path = dir
            .path()
            .join("sales/_delta_log/00000000000000000002.checkpoint.parquet");
        fs::write(checkpoint_path, checkpoint_tests::sample_checkpoint()).unwrap();
        write(&dir, "sales/_delta_log/_last_checkpoint", r#"{"version":2,"size":3}"#);

        let snapshot = reader(&dir).await.read_log_snapshot("sales").await.unwrap();
        let checkpoint = snapshot.checkpoint.unwrap();
        assert_eq!(checkpoint.version, 2);
        let paths: Vec<&str> = checkpoint.live_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["day=Mon/a b.parquet", "day=Tue/c.parquet"]);
        let versions: Vec<u64> = snapshot.commits.iter().map(|c| c.version).collect();
        assert_eq!(versions, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_snapshot_checkpoint_only() {
        let dir = TempDir::new().unwrap();
        let checkpoint_path = dir
            .path()
            .join("sales/_delta_log/00000000000000000002.checkpoint.parquet");
        fs::create_dir_all(checkpoint_path.parent().unwrap()).unwrap();
        fs::write(checkpoint_path, checkpoint_tests::sample_checkpoint()).unwrap();

        let snapshot = reader(&dir).await.read_log_snapshot("sales").await.unwrap();
        assert_eq!(snapshot.checkpoint.map(|c| c.live_files.len()), Some(2));
        assert!(snapshot.commits.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_without_log_fails() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/part-0.parquet", "x");

        let err = reader(&dir)
            .await
            .read_log_snapshot("sales")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no commit files"));
    }
}
