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

use crate::analyze::anomaly::IntegrityAnomaly;
use crate::analyze::config::AnalysisConfig;
use crate::analyze::error::AnalyzeError;
use crate::analyze::metrics::{
    HealthMetrics, HealthReport, HistoryMetrics, OperationCounts, OrphanMetrics, SkewMetrics,
    TimedLikeMetrics,
};
use crate::analyze::model::{CommitRecord, LogSnapshot, PartitionStats, PhysicalFile};
use crate::analyze::orphan::detect_orphans;
use crate::analyze::recommend::{recommend, Recommendation};
use crate::analyze::reconcile::{reconcile, reconcile_snapshot, LiveFiles, ReconciledLog};
use crate::analyze::size::{aggregate_sizes, SizeAggregation};
use crate::analyze::skew::analyze_skew;
use crate::reader::delta::{DeltaFileLister, DeltaLogReader, DeltaStatsPartitionLoader};
use crate::reader::{LogReader, PartitionLoader, StorageLister};
use crate::storage::{StorageConfig, StorageError, StorageProviderFactory};
use crate::util::util::{measure_dur, measure_dur_async, StageTimings};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Builder for a [`HealthAnalyzer`] reading Delta Lake tables from storage.
///
/// # Examples
///
/// ```no_run
/// use delta_pulse::{AnalysisConfig, HealthAnalyzer, StorageConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let storage_config = StorageConfig::local().with_option("path", "/path/to/lake");
///
/// let analyzer = HealthAnalyzer::builder(storage_config)
///     .with_parallelism(8)
///     .build()
///     .await?;
/// let report = analyzer
///     .analyze("sales", &AnalysisConfig::default())
///     .await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct HealthAnalyzerBuilder {
    config: StorageConfig,
    parallelism: Option<usize>,
}

impl HealthAnalyzerBuilder {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            parallelism: None,
        }
    }

    /// Number of commit files read concurrently.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Initialize the storage provider and wire up the Delta collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub async fn build(self) -> Result<HealthAnalyzer, StorageError> {
        let storage_provider = StorageProviderFactory::from_config(self.config).await?;
        let log_reader = DeltaLogReader::new(
            Arc::clone(&storage_provider),
            self.parallelism.unwrap_or(1),
        );
        Ok(HealthAnalyzer::new(
            Arc::new(log_reader),
            Arc::new(DeltaFileLister::new(storage_provider)),
            Arc::new(DeltaStatsPartitionLoader::new()),
        ))
    }
}

/// Runs the health analysis pipeline against a table.
///
/// Each call to [`HealthAnalyzer::analyze`] takes a fresh snapshot from the
/// collaborators; nothing is cached between calls.
pub struct HealthAnalyzer {
    log_reader: Arc<dyn LogReader>,
    storage_lister: Arc<dyn StorageLister>,
    partition_loader: Arc<dyn PartitionLoader>,
}

impl HealthAnalyzer {
    pub fn new(
        log_reader: Arc<dyn LogReader>,
        storage_lister: Arc<dyn StorageLister>,
        partition_loader: Arc<dyn PartitionLoader>,
    ) -> Self {
        Self {
            log_reader,
            storage_lister,
            partition_loader,
        }
    }

    pub fn builder(config: StorageConfig) -> HealthAnalyzerBuilder {
        HealthAnalyzerBuilder::new(config)
    }

    /// Analyze the table at `table_path`.
    ///
    /// The log and the storage listing are read concurrently. The log is
    /// reconciled into the live set, partition statistics are loaded for that
    /// live set, and then skew, orphan and size analysis run as parallel tasks
    /// that are all joined before the recommendations are derived.
    ///
    /// # Errors
    ///
    /// Any collaborator failure aborts the analysis and is returned unchanged.
    /// Integrity anomalies are not errors; they are listed on the report.
    pub async fn analyze(
        &self,
        table_path: &str,
        config: &AnalysisConfig,
    ) -> Result<HealthReport, AnalyzeError> {
        config.validate()?;
        info!("Analyzing table, table_path={}", table_path);
        let mut timings = StageTimings::new();

        let (log, physical_files) = measure_dur_async(
            "collect_inputs_dur",
            &mut timings,
            || async {
                tokio::try_join!(
                    async {
                        self.log_reader
                            .read_log_snapshot(table_path)
                            .await
                            .map_err(AnalyzeError::from)
                    },
                    async {
                        self.storage_lister
                            .list_physical_files(table_path)
                            .await
                            .map_err(AnalyzeError::from)
                    },
                )
            },
            Some(|(log, files): &(LogSnapshot, Vec<PhysicalFile>)| {
                format!(
                    "checkpoint_version={:?}, commits={}, physical_files={}",
                    log.checkpoint.as_ref().map(|c| c.version),
                    log.commits.len(),
                    files.len()
                )
            }),
        )
        .await?;

        let ReconciledLog {
            operations,
            history,
            live_files,
            anomalies,
            truncated,
        } = measure_dur(
            "reconcile_dur",
            &mut timings,
            || reconcile_snapshot(&log),
            Some(|r: &ReconciledLog| {
                format!("live_files={}, anomalies={}", r.live_files.len(), r.anomalies.len())
            }),
        );

        let partition_stats = measure_dur_async(
            "partition_stats_dur",
            &mut timings,
            || async {
                self.partition_loader
                    .load_partition_stats(table_path, &live_files)
                    .await
                    .map_err(AnalyzeError::from)
            },
            Some(|stats: &Vec<PartitionStats>| format!("partitions={}", stats.len())),
        )
        .await?;

        let skew_threshold = config.skew_threshold;
        let skew_task =
            tokio::task::spawn_blocking(move || analyze_skew(&partition_stats, skew_threshold));
        let live_files = Arc::new(live_files);
        let physical_files = Arc::new(physical_files);
        let orphan_task = {
            let live_files = Arc::clone(&live_files);
            let physical_files = Arc::clone(&physical_files);
            tokio::task::spawn_blocking(move || find_orphans(truncated, &live_files, &physical_files))
        };
        let small_file_threshold = config.small_file_threshold_bytes;
        let size_task = tokio::task::spawn_blocking(move || {
            aggregate_sizes(&live_files, &physical_files, small_file_threshold)
        });

        let (skew, orphans, sizes) = measure_dur_async(
            "analyzers_dur",
            &mut timings,
            || async { tokio::try_join!(skew_task, orphan_task, size_task) },
            Some(|(skew, orphans, _): &(SkewMetrics, OrphanMetrics, SizeAggregation)| {
                format!(
                    "skewness_max={:.3}, orphan_files={}",
                    skew.skewness_max, orphans.orphan_files_count
                )
            }),
        )
        .await?;

        let outputs = AnalyzerOutputs {
            operations,
            history,
            log_anomalies: anomalies,
            skew,
            orphans,
            sizes,
        };
        Ok(assemble_report(table_path, outputs, config, &mut timings))
    }
}

/// Orphans cannot be told apart from files added by cleaned-up commits when
/// the log is truncated, so none are reported then.
fn find_orphans(
    truncated: bool,
    live_files: &LiveFiles,
    physical_files: &[PhysicalFile],
) -> OrphanMetrics {
    if truncated {
        OrphanMetrics::default()
    } else {
        detect_orphans(live_files, physical_files)
    }
}

/// Run the whole pipeline synchronously over a snapshot the caller already holds.
///
/// Produces the same report as [`HealthAnalyzer::analyze`] would for the same
/// collaborator outputs.
///
/// # Errors
///
/// Only an invalid configuration is rejected.
pub fn analyze_snapshot(
    table_path: &str,
    commits: &[CommitRecord],
    physical_files: &[PhysicalFile],
    partition_stats: &[PartitionStats],
    config: &AnalysisConfig,
) -> Result<HealthReport, AnalyzeError> {
    config.validate()?;
    let mut timings = StageTimings::new();

    let skew = measure_dur(
        "skew_dur",
        &mut timings,
        || analyze_skew(partition_stats, config.skew_threshold),
        None,
    );
    let reconciled = measure_dur("reconcile_dur", &mut timings, || reconcile(commits), None);
    let orphans = measure_dur(
        "orphans_dur",
        &mut timings,
        || find_orphans(reconciled.truncated, &reconciled.live_files, physical_files),
        None,
    );
    let sizes = measure_dur(
        "sizes_dur",
        &mut timings,
        || {
            aggregate_sizes(
                &reconciled.live_files,
                physical_files,
                config.small_file_threshold_bytes,
            )
        },
        None,
    );

    let outputs = AnalyzerOutputs {
        operations: reconciled.operations,
        history: reconciled.history,
        log_anomalies: reconciled.anomalies,
        skew,
        orphans,
        sizes,
    };
    Ok(assemble_report(table_path, outputs, config, &mut timings))
}

struct AnalyzerOutputs {
    operations: OperationCounts,
    history: HistoryMetrics,
    log_anomalies: Vec<IntegrityAnomaly>,
    skew: SkewMetrics,
    orphans: OrphanMetrics,
    sizes: SizeAggregation,
}

fn assemble_report(
    table_path: &str,
    outputs: AnalyzerOutputs,
    config: &AnalysisConfig,
    timings: &mut StageTimings<'_>,
) -> HealthReport {
    let AnalyzerOutputs {
        operations,
        history,
        log_anomalies,
        skew,
        orphans,
        sizes,
    } = outputs;

    let mut metrics = HealthMetrics {
        operations,
        history,
        skew,
        size: sizes.size,
        orphans,
        small_files: sizes.small_files,
    };
    let mut anomalies = log_anomalies;
    anomalies.extend(sizes.missing_files);

    let recommendation = measure_dur(
        "recommend_dur",
        timings,
        || recommend(&metrics, &anomalies, config),
        Some(|r: &Recommendation| {
            format!(
                "health_score={:.1}, needs_vacuum={}, needs_optimize={}",
                r.health_score, r.needs_vacuum, r.needs_optimize
            )
        }),
    );

    if recommendation.needs_vacuum {
        metrics.size.files_needing_vacuum = metrics.orphans.orphan_files_count;
    }

    HealthReport {
        table_path: table_path.to_string(),
        analysis_timestamp: Utc::now(),
        metrics,
        needs_vacuum: recommendation.needs_vacuum,
        needs_optimize: recommendation.needs_optimize,
        health_score: recommendation.health_score,
        health_status: recommendation.health_status,
        recommendations: recommendation.recommendations,
        anomalies,
        timed_metrics: TimedLikeMetrics::from(&*timings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::error::{DataLoadError, LogReadError, StorageAccessError};
    use crate::analyze::metrics::HealthStatus;
    use crate::analyze::model::{Checkpoint, FileRef, Operation};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn commit(version: u64, operation: Operation) -> CommitRecord {
        let ts = Utc.timestamp_opt(1_700_000_000 + version as i64, 0).unwrap();
        CommitRecord::new(version, ts, operation)
    }

    /// Collaborators answering from fixed data, or failing on demand.
    #[derive(Default)]
    struct MockTable {
        commits: Vec<CommitRecord>,
        physical_files: Vec<PhysicalFile>,
        partitions: Vec<PartitionStats>,
        fail_log: bool,
        fail_listing: bool,
        fail_partitions: bool,
    }

    #[async_trait]
    impl LogReader for MockTable {
        async fn read_commit_log(
            &self,
            table_path: &str,
        ) -> Result<Vec<CommitRecord>, LogReadError> {
            if self.fail_log {
                return Err(LogReadError::new(table_path, "corrupt log"));
            }
            Ok(self.commits.clone())
        }
    }

    #[async_trait]
    impl StorageLister for MockTable {
        async fn list_physical_files(
            &self,
            table_path: &str,
        ) -> Result<Vec<PhysicalFile>, StorageAccessError> {
            if self.fail_listing {
                return Err(StorageAccessError::new(table_path, "access denied"));
            }
            Ok(self.physical_files.clone())
        }
    }

    #[async_trait]
    impl PartitionLoader for MockTable {
        async fn load_partition_stats(
            &self,
            table_path: &str,
            _live_files: &LiveFiles,
        ) -> Result<Vec<PartitionStats>, DataLoadError> {
            if self.fail_partitions {
                return Err(DataLoadError::new(table_path, "unreadable"));
            }
            Ok(self.partitions.clone())
        }
    }

    fn analyzer(table: MockTable) -> HealthAnalyzer {
        let table = Arc::new(table);
        HealthAnalyzer::new(table.clone(), table.clone(), table)
    }

    fn orphan_table() -> MockTable {
        MockTable {
            commits: vec![commit(0, Operation::Write)
                .with_added([FileRef::new("a", 100), FileRef::new("b", 100)])],
            physical_files: vec![
                PhysicalFile::new("a", 100),
                PhysicalFile::new("b", 100),
                PhysicalFile::new("c", 50),
            ],
            partitions: vec![PartitionStats::unkeyed(10)],
            ..MockTable::default()
        }
    }

    #[tokio::test]
    async fn test_orphan_file_detected() {
        let report = analyzer(orphan_table())
            .analyze("sales", &AnalysisConfig::default())
            .await
            .unwrap();

        let m = &report.metrics;
        assert_eq!(m.orphans.orphan_file_paths, vec!["c".to_string()]);
        assert!(m.orphans.has_orphan_files);
        assert_eq!(m.orphans.orphan_bytes, 50);
        assert_eq!(m.size.folder_size_bytes, 250);
        assert_eq!(m.size.table_size_bytes, 200);
        assert_eq!(m.operations.writes, 1);
        assert!(report.needs_vacuum);
        assert_eq!(m.size.files_needing_vacuum, 1);
        assert!(report.anomalies.is_empty());
        assert_eq!(report.table_path, "sales");
    }

    #[tokio::test]
    async fn test_balanced_partitions() {
        let table = MockTable {
            partitions: vec![
                PartitionStats::unkeyed(1000),
                PartitionStats::unkeyed(1000),
                PartitionStats::unkeyed(1000),
            ],
            ..MockTable::default()
        };
        let report = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(report.metrics.skew.skewness_max, 0.0);
        assert!(!report.metrics.skew.is_skewed);
        assert!(!report.needs_optimize);
    }

    #[tokio::test]
    async fn test_skewed_partitions_need_optimize() {
        let table = MockTable {
            partitions: vec![
                PartitionStats::unkeyed(10),
                PartitionStats::unkeyed(10),
                PartitionStats::unkeyed(1000),
            ],
            ..MockTable::default()
        };
        let report = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        let skew = &report.metrics.skew;
        assert!((skew.skewness_max - 1.941).abs() < 1e-3);
        assert!((skew.skewness_average - 1.294).abs() < 1e-3);
        assert!(skew.is_skewed);
        assert!(report.needs_optimize);
    }

    #[tokio::test]
    async fn test_empty_table() {
        let report = analyzer(MockTable::default())
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        let m = &report.metrics;
        assert_eq!(m.operations, OperationCounts::default());
        assert_eq!(m.small_files.avg_file_size_bytes, 0);
        assert_eq!(m.size.table_size_bytes, 0);
        assert_eq!(m.size.folder_size_bytes, 0);
        assert_eq!(m.history.latest_version, None);
        assert!(report.anomalies.is_empty());
        assert!(!report.needs_vacuum);
        assert!(!report.needs_optimize);
        assert_eq!(report.health_score, 62.5);
        assert_eq!(report.health_status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_matching_listing_has_no_orphans() {
        let table = MockTable {
            commits: vec![
                commit(0, Operation::Write).with_added([FileRef::new("a", 10)]),
                commit(1, Operation::Write).with_added([FileRef::new("b", 20)]),
            ],
            physical_files: vec![PhysicalFile::new("a", 10), PhysicalFile::new("b", 20)],
            ..MockTable::default()
        };
        let report = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(
            report.metrics.size.table_size_bytes,
            report.metrics.size.folder_size_bytes
        );
        assert!(!report.metrics.orphans.has_orphan_files);
    }

    #[tokio::test]
    async fn test_anomalies_collected_not_fatal() {
        let table = MockTable {
            commits: vec![
                commit(0, Operation::Write).with_added([FileRef::new("a", 10)]),
                commit(2, Operation::Delete).with_removed([FileRef::new("ghost", 1)]),
            ],
            physical_files: vec![],
            ..MockTable::default()
        };
        let report = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(
            report.anomalies,
            vec![
                IntegrityAnomaly::VersionGap {
                    expected: 1,
                    found: 2
                },
                IntegrityAnomaly::RemovedUnknownFile {
                    path: "ghost".to_string(),
                    version: 2
                },
                IntegrityAnomaly::MissingFile {
                    path: "a".to_string(),
                    log_size_bytes: 10
                },
            ]
        );
        assert_eq!(report.metrics.size.table_size_bytes, 10);
        assert_eq!(report.metrics.size.missing_files_count, 1);
    }

    #[tokio::test]
    async fn test_log_failure_is_fatal() {
        let table = MockTable {
            fail_log: true,
            ..orphan_table()
        };
        let err = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::LogRead(_)));
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let table = MockTable {
            fail_listing: true,
            ..orphan_table()
        };
        let err = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::StorageAccess(_)));
    }

    #[tokio::test]
    async fn test_partition_failure_is_fatal() {
        let table = MockTable {
            fail_partitions: true,
            ..orphan_table()
        };
        let err = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::DataLoad(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = AnalysisConfig::default().with_skew_threshold(f64::NAN);
        let err = analyzer(orphan_table())
            .analyze("t", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_analysis_is_idempotent() {
        let analyzer = analyzer(orphan_table());
        let config = AnalysisConfig::default();
        let mut first = analyzer.analyze("t", &config).await.unwrap();
        let mut second = analyzer.analyze("t", &config).await.unwrap();
        for report in [&mut first, &mut second] {
            report.analysis_timestamp = Utc.timestamp_opt(0, 0).unwrap();
            report.timed_metrics = TimedLikeMetrics::default();
        }
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_timings_recorded() {
        let report = analyzer(orphan_table())
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        let stages: Vec<&str> = report
            .timed_metrics
            .duration_collection
            .iter()
            .map(|(name, _, _)| name.as_str())
            .collect();
        assert_eq!(
            stages,
            vec![
                "collect_inputs_dur",
                "reconcile_dur",
                "partition_stats_dur",
                "analyzers_dur",
                "recommend_dur"
            ]
        );
    }

    #[tokio::test]
    async fn test_snapshot_matches_async_pipeline() {
        let table = orphan_table();
        let config = AnalysisConfig::default();
        let mut snapshot = analyze_snapshot(
            "t",
            &table.commits,
            &table.physical_files,
            &table.partitions,
            &config,
        )
        .unwrap();
        let mut report = analyzer(table).analyze("t", &config).await.unwrap();
        for r in [&mut snapshot, &mut report] {
            r.analysis_timestamp = Utc.timestamp_opt(0, 0).unwrap();
            r.timed_metrics = TimedLikeMetrics::default();
        }
        assert_eq!(snapshot, report);
    }

    #[tokio::test]
    async fn test_no_vacuum_within_orphan_threshold() {
        let config = AnalysisConfig::default().with_orphan_byte_threshold(50);
        let report = analyzer(orphan_table()).analyze("t", &config).await.unwrap();
        assert!(report.metrics.orphans.has_orphan_files);
        assert!(!report.needs_vacuum);
        assert_eq!(report.metrics.size.files_needing_vacuum, 0);
    }

    #[tokio::test]
    async fn test_truncated_log_reports_no_orphans() {
        let table = MockTable {
            commits: vec![
                commit(5, Operation::Write).with_added([FileRef::new("b", 100)]),
                commit(6, Operation::Delete).with_removed([FileRef::new("a", 100)]),
            ],
            // `a` was added by a cleaned-up commit and is not an orphan
            physical_files: vec![PhysicalFile::new("b", 100), PhysicalFile::new("old", 100)],
            ..MockTable::default()
        };
        let report = analyzer(table)
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();
        assert!(!report.metrics.orphans.has_orphan_files);
        assert!(!report.needs_vacuum);
        assert_eq!(
            report.anomalies[0],
            IntegrityAnomaly::TruncatedLog { first_version: 5 }
        );
    }

    /// Log whose early commits were replaced by a checkpoint.
    struct CheckpointedLog {
        checkpoint: Checkpoint,
        commits: Vec<CommitRecord>,
    }

    #[async_trait]
    impl LogReader for CheckpointedLog {
        async fn read_commit_log(
            &self,
            _table_path: &str,
        ) -> Result<Vec<CommitRecord>, LogReadError> {
            Ok(self.commits.clone())
        }

        async fn read_log_snapshot(&self, _table_path: &str) -> Result<LogSnapshot, LogReadError> {
            Ok(LogSnapshot {
                checkpoint: Some(self.checkpoint.clone()),
                commits: self.commits.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_checkpoint_files_are_live() {
        let log = CheckpointedLog {
            checkpoint: Checkpoint {
                version: 3,
                live_files: vec![FileRef::new("a", 100), FileRef::new("b", 100)],
            },
            commits: vec![
                commit(3, Operation::Write).with_added([FileRef::new("b", 100)]),
                commit(4, Operation::Delete).with_removed([FileRef::new("b", 100)]),
            ],
        };
        let storage = Arc::new(MockTable {
            physical_files: vec![
                PhysicalFile::new("a", 100),
                PhysicalFile::new("b", 100),
                PhysicalFile::new("c", 50),
            ],
            ..MockTable::default()
        });
        let analyzer = HealthAnalyzer::new(Arc::new(log), storage.clone(), storage);
        let report = analyzer
            .analyze("t", &AnalysisConfig::default())
            .await
            .unwrap();

        let orphans = &report.metrics.orphans.orphan_file_paths;
        assert_eq!(orphans, &vec!["b".to_string(), "c".to_string()]);
        assert!(report.anomalies.is_empty());
        assert_eq!(report.metrics.size.data_file_count, 1);
        assert_eq!(report.metrics.history.latest_version, Some(4));
    }

    fn write_file(dir: &TempDir, relative: &str, contents: &[u8]) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    async fn local_analyzer(dir: &TempDir) -> HealthAnalyzer {
        let config = StorageConfig::local().with_option("path", dir.path().to_string_lossy());
        HealthAnalyzer::builder(config).build().await.unwrap()
    }

    #[tokio::test]
    async fn test_encoded_partition_paths_match_storage() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "sales/city=New York/part-0.parquet", &[b'x'; 100]);
        write_file(
            &dir,
            "sales/_delta_log/00000000000000000000.json",
            br#"{"add":{"path":"city=New%20York/part-0.parquet","size":100,"partitionValues":{"city":"New York"},"dataChange":true,"stats":"{\"numRecords\":4}"}}
{"commitInfo":{"timestamp":1700000000000,"operation":"WRITE"}}
"#,
        );

        let report = local_analyzer(&dir)
            .await
            .analyze("sales", &AnalysisConfig::default())
            .await
            .unwrap();
        assert!(report.metrics.orphans.orphan_file_paths.is_empty());
        assert!(report.anomalies.is_empty());
        assert!(!report.needs_vacuum);
        assert_eq!(report.metrics.size.table_size_bytes, 100);
        assert_eq!(report.metrics.skew.record_count, 4);
    }

    #[tokio::test]
    async fn test_unpartitioned_table_without_stats_is_analyzed() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "sales/part-0.parquet", &[b'x'; 10]);
        write_file(
            &dir,
            "sales/_delta_log/00000000000000000000.json",
            br#"{"add":{"path":"part-0.parquet","size":10,"partitionValues":{},"dataChange":true}}
{"commitInfo":{"timestamp":1700000000000,"operation":"WRITE"}}
"#,
        );

        let report = local_analyzer(&dir)
            .await
            .analyze("sales", &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(report.metrics.skew.partition_count, 1);
        assert_eq!(report.metrics.skew.skewness_max, 0.0);
        assert_eq!(report.metrics.size.data_file_count, 1);
        assert!(report.anomalies.is_empty());
    }
}
