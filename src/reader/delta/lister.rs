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
use std::sync::Arc;
use std::time::SystemTime;
use tracing::info;

use super::log::DELTA_LOG_DIR;
use crate::analyze::error::StorageAccessError;
use crate::analyze::model::PhysicalFile;
use crate::reader::StorageLister;
use crate::storage::StorageProvider;
use crate::util::util::relative_to_table;

const CHANGE_DATA_DIR: &str = "_change_data";
const DATA_FILE_SUFFIX: &str = ".parquet";

/// Whether a table-relative path is a data file that belongs in the orphan check.
pub fn is_data_file(relative_path: &str) -> bool {
    let in_metadata_dir = [DELTA_LOG_DIR, CHANGE_DATA_DIR].iter().any(|dir| {
        relative_path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
    });
    !in_metadata_dir && relative_path.ends_with(DATA_FILE_SUFFIX)
}

/// Lists the data files physically present under a Delta table directory.
pub struct DeltaFileLister {
    storage_provider: Arc<dyn StorageProvider>,
}

impl DeltaFileLister {
    pub fn new(storage_provider: Arc<dyn StorageProvider>) -> Self {
        Self { storage_provider }
    }
}

#[async_trait]
impl StorageLister for DeltaFileLister {
    async fn list_physical_files(
        &self,
        table_path: &str,
    ) -> Result<Vec<PhysicalFile>, StorageAccessError> {
        let start = SystemTime::now();
        self.storage_provider
            .validate_connection(table_path)
            .await
            .map_err(|e| {
                StorageAccessError::new(table_path, "table location is not accessible")
                    .with_source(e)
            })?;

        let listing = self
            .storage_provider
            .list_files(table_path, true)
            .await
            .map_err(|e| StorageAccessError::new(table_path, "listing failed").with_source(e))?;
        let listed_count = listing.len();

        let files: Vec<PhysicalFile> = listing
            .into_iter()
            .map(|file| (relative_to_table(table_path, &file.path), file.size))
            .filter(|(path, _)| is_data_file(path))
            .map(|(path, size)| PhysicalFile::new(path, size))
            .collect();

        info!(
            "Listed physical files, table_path={}, listed={}, data_files={}, took={}",
            table_path,
            listed_count,
            files.len(),
            start.elapsed().unwrap_or_default().as_millis()
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageProviderFactory};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, size: usize) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![b'x'; size]).unwrap();
    }

    async fn lister(dir: &TempDir) -> DeltaFileLister {
        let config = StorageConfig::local().with_option("path", dir.path().to_string_lossy());
        DeltaFileLister::new(StorageProviderFactory::from_config(config).await.unwrap())
    }

    #[test]
    fn test_is_data_file() {
        assert!(is_data_file("part-0.parquet"));
        assert!(is_data_file("day=Mon/part-0.parquet"));
        assert!(!is_data_file("_delta_log/00000000000000000010.checkpoint.parquet"));
        assert!(!is_data_file("_change_data/cdc-0.parquet"));
        assert!(!is_data_file("day=Mon/.part-0.parquet.crc"));
        assert!(is_data_file("_delta_log_backup/part-0.parquet"));
    }

    #[tokio::test]
    async fn test_lists_only_data_files_relative_to_table() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/day=Mon/part-0.parquet", 100);
        write(&dir, "sales/part-1.parquet", 50);
        write(&dir, "sales/_delta_log/00000000000000000000.json", 10);
        write(&dir, "sales/_delta_log/00000000000000000010.checkpoint.parquet", 10);
        write(&dir, "sales/_change_data/cdc-0.parquet", 10);
        write(&dir, "other/part-9.parquet", 10);

        let mut files = lister(&dir)
            .await
            .list_physical_files("sales")
            .await
            .unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            files,
            vec![
                PhysicalFile::new("day=Mon/part-0.parquet", 100),
                PhysicalFile::new("part-1.parquet", 50),
            ]
        );
    }

    #[tokio::test]
    async fn test_partition_directory_with_space_is_listed_decoded() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/city=New York/part-0.parquet", 100);

        let files = lister(&dir)
            .await
            .list_physical_files("sales")
            .await
            .unwrap();
        assert_eq!(
            files,
            vec![PhysicalFile::new("city=New York/part-0.parquet", 100)]
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let err = lister(&dir)
            .await
            .list_physical_files("nope")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not accessible"));
    }
}
