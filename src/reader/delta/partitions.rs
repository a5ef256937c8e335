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

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::analyze::error::DataLoadError;
use crate::analyze::model::{PartitionStats, PartitionValues};
use crate::analyze::reconcile::LiveFiles;
use crate::reader::PartitionLoader;

#[derive(Debug, Default)]
struct PartitionTally {
    records: u64,
    with_stats: usize,
    without_stats: usize,
}

/// Per-partition record counts derived from the `numRecords` statistics the
/// writers store on add actions. No data file is opened.
///
/// Statistics are optional in Delta. On a table with a single partition the
/// counts cannot skew, so files without them are tolerated silently and the
/// record count is a lower bound. With several partitions such files are
/// left out with a warning, and a partition with no statistics at all is
/// dropped from the result.
#[derive(Debug, Default)]
pub struct DeltaStatsPartitionLoader;

impl DeltaStatsPartitionLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PartitionLoader for DeltaStatsPartitionLoader {
    async fn load_partition_stats(
        &self,
        table_path: &str,
        live_files: &LiveFiles,
    ) -> Result<Vec<PartitionStats>, DataLoadError> {
        let mut tallies: BTreeMap<&PartitionValues, PartitionTally> = BTreeMap::new();
        for file in live_files.values() {
            let tally = tallies.entry(&file.partition_values).or_default();
            match file.num_records {
                Some(records) => {
                    tally.records += records;
                    tally.with_stats += 1;
                }
                None => tally.without_stats += 1,
            }
        }

        let without_stats: usize = tallies.values().map(|t| t.without_stats).sum();
        let partitioned = tallies.len() > 1;
        if partitioned && without_stats > 0 {
            warn!(
                "Live files without numRecords statistics left out of skew, table_path={}, files={}",
                table_path, without_stats
            );
        }

        let stats: Vec<PartitionStats> = tallies
            .into_iter()
            .filter(|(key, tally)| {
                let keep = !partitioned || tally.with_stats > 0;
                if !keep {
                    warn!(
                        "Partition has no record statistics, table_path={}, partition={:?}",
                        table_path, key
                    );
                }
                keep
            })
            .map(|(key, tally)| PartitionStats::new(key.clone(), tally.records))
            .collect();

        info!(
            "Loaded partition statistics, table_path={}, live_files={}, partitions={}, files_without_stats={}",
            table_path,
            live_files.len(),
            stats.len(),
            without_stats
        );
        Ok(stats)
    }
}
