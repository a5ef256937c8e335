// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

//! Table readers
//!
//! The analysis engine consumes three collaborators, each behind an async
//! trait so that tests and other table formats can plug in their own:
//!
//! - [`LogReader`] yields the commit records of the transaction log, plus
//!   the latest checkpoint when the format keeps one
//! - [`StorageLister`] yields the data files physically present
//! - [`PartitionLoader`] yields record counts per partition of the live set
//!
//! [`delta`] provides the Delta Lake implementations over any
//! [`StorageProvider`](crate::storage::StorageProvider).

use async_trait::async_trait;

use crate::analyze::error::{DataLoadError, LogReadError, StorageAccessError};
use crate::analyze::model::{CommitRecord, LogSnapshot, PartitionStats, PhysicalFile};
use crate::analyze::reconcile::LiveFiles;

pub mod delta;

#[async_trait]
pub trait LogReader: Send + Sync {
    /// All commit records of the table, in any order.
    async fn read_commit_log(&self, table_path: &str) -> Result<Vec<CommitRecord>, LogReadError>;

    /// The retained commits together with the checkpoint they build on.
    ///
    /// Readers of formats without checkpoints can rely on the default, which
    /// wraps [`LogReader::read_commit_log`].
    async fn read_log_snapshot(&self, table_path: &str) -> Result<LogSnapshot, LogReadError> {
        Ok(LogSnapshot::from_commits(
            self.read_commit_log(table_path).await?,
        ))
    }
}

#[async_trait]
pub trait StorageLister: Send + Sync {
    /// Data files under the table directory, paths relative to the table root.
    async fn list_physical_files(
        &self,
        table_path: &str,
    ) -> Result<Vec<PhysicalFile>, StorageAccessError>;
}

#[async_trait]
pub trait PartitionLoader: Send + Sync {
    /// One entry per distinct partition-value combination of `live_files`,
    /// the table state reconciled from the log.
    async fn load_partition_stats(
        &self,
        table_path: &str,
        live_files: &LiveFiles,
    ) -> Result<Vec<PartitionStats>, DataLoadError>;
}
