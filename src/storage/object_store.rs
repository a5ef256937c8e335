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

use super::config::{StorageConfig, StorageType};
use super::error::{StorageError, StorageResult};
use super::provider::{string_to_path, FileMetadata, StorageProvider};
use crate::util::retry::RetryPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use object_store::{
    aws::AmazonS3Builder, azure::MicrosoftAzureBuilder, gcp::GoogleCloudStorageBuilder,
    local::LocalFileSystem, ClientOptions, ObjectMeta, ObjectStore, RetryConfig,
};
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Storage provider backed by any `object_store` backend
pub struct ObjectStoreProvider {
    pub config: StorageConfig,
    pub store: Arc<dyn ObjectStore>,
    pub base_path: String,
    retry_policy: RetryPolicy,
}

impl ObjectStoreProvider {
    /// Create a new storage provider from configuration.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Required configuration options are missing for the storage type
    /// * An `endpoint` option is not a valid URL
    /// * The object store backend cannot be initialized
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let (store, base_path) = Self::build_store(&config)?;
        let retry_policy = RetryPolicy::with_max_retries(Self::get_max_retries(&config));

        info!(
            "Created storage provider, type={}, base_path={}",
            config.storage_type_str(),
            base_path
        );

        Ok(Self {
            config,
            store: Arc::from(store),
            base_path,
            retry_policy,
        })
    }

    fn build_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        if let Some(endpoint) = config.get_option("endpoint") {
            Url::parse(endpoint)?;
        }
        match config.storage_type {
            StorageType::Local => Self::build_local_store(config),
            StorageType::Aws => Self::build_aws_store(config),
            StorageType::Azure => Self::build_azure_store(config),
            StorageType::Gcs => Self::build_gcs_store(config),
        }
    }

    /// Build a local filesystem store rooted at the canonicalized `path` option.
    ///
    /// # Errors
    ///
    /// Fails when `path` is missing, does not exist, or is not a directory.
    fn build_local_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let path = config.get_option("path").ok_or_else(|| {
            StorageError::ConfigError("Local storage requires 'path' option".to_string())
        })?;

        let canonical_path = PathBuf::from(path).canonicalize().map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to resolve path '{}': {} (path must exist)",
                path, e
            ))
        })?;

        if !canonical_path.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Base path is not a directory: {}",
                canonical_path.display()
            )));
        }

        let store = LocalFileSystem::new_with_prefix(&canonical_path)?;
        Ok((
            Box::new(store),
            canonical_path.to_string_lossy().to_string(),
        ))
    }

    fn build_connection_options(config: &StorageConfig) -> ClientOptions {
        let mut client_options = ClientOptions::default();
        if let Some(timeout_str) = config.get_option("timeout") {
            if timeout_str == "0" || timeout_str == "disabled" {
                client_options = client_options.with_timeout_disabled();
            } else if let Ok(sec) = timeout_str.parse::<u64>() {
                client_options = client_options.with_timeout(Duration::from_secs(sec))
            }
        };
        if let Some(connect_timeout_str) = config.get_option("connect_timeout") {
            if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
                client_options = client_options.with_connect_timeout_disabled();
            } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
                client_options = client_options.with_connect_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(sec) = config
            .get_option("pool_idle_timeout")
            .and_then(|s| s.parse::<u64>().ok())
        {
            client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec))
        }
        if let Some(max_idle) = config
            .get_option("pool_max_idle_per_host")
            .and_then(|s| s.parse::<usize>().ok())
        {
            client_options = client_options.with_pool_max_idle_per_host(max_idle)
        }
        client_options
    }

    fn build_retry_options(config: &StorageConfig) -> RetryConfig {
        let default_retry_config = RetryConfig::default();
        let retry_timeout = config
            .get_option("retry_timeout")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(default_retry_config.retry_timeout);
        RetryConfig {
            backoff: Default::default(),
            max_retries: Self::get_max_retries(config),
            retry_timeout,
        }
    }

    /// Max retries from config, 10 when unset or unparsable.
    fn get_max_retries(config: &StorageConfig) -> usize {
        config
            .get_option("max_retries")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(10)
    }

    fn build_aws_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = AmazonS3Builder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let mut bucket: Option<&String> = None;
        let mut endpoint: Option<&String> = None;

        for (key, value) in config.backend_options() {
            match key.as_str() {
                "bucket" => {
                    bucket = Some(value);
                    builder = builder.with_bucket_name(value);
                }
                "region" => builder = builder.with_region(value),
                "access_key_id" => builder = builder.with_access_key_id(value),
                "secret_access_key" => builder = builder.with_secret_access_key(value),
                "session_token" | "token" => builder = builder.with_token(value),
                "endpoint" => {
                    endpoint = Some(value);
                    builder = builder.with_endpoint(value);
                }
                "allow_http" => builder = builder.with_allow_http(value.eq_ignore_ascii_case("true")),
                _ => warn!("Unknown AWS S3 option: {}", key),
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))?;

        let base_url = match (endpoint, bucket) {
            (Some(endpoint_url), _) => endpoint_url.trim_end_matches('/').to_string(),
            (None, Some(bucket_name)) => format!("s3://{}", bucket_name),
            (None, None) => "s3://".to_string(),
        };

        Ok((Box::new(store), base_url))
    }

    fn build_azure_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let account_name = config.get_option("account_name").ok_or_else(|| {
            StorageError::ConfigError("Azure requires 'account_name' option".to_string())
        })?;
        let container = config.get_option("container").ok_or_else(|| {
            StorageError::ConfigError("Azure requires 'container' option".to_string())
        })?;

        let mut builder = MicrosoftAzureBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config))
            .with_account(account_name)
            .with_container_name(container);

        let mut use_fabric_endpoint = false;
        let mut custom_endpoint: Option<&String> = None;

        for (key, value) in config.backend_options() {
            match key.as_str() {
                "container" | "account_name" => (),
                "access_key" | "account_key" => builder = builder.with_access_key(value),
                "sas_token" => {
                    let pairs: Vec<(String, String)> = value
                        .trim_start_matches('?')
                        .split('&')
                        .filter_map(|pair| {
                            pair.split_once('=')
                                .map(|(k, v)| (k.to_string(), v.to_string()))
                        })
                        .collect();
                    builder = builder.with_sas_authorization(pairs);
                }
                "tenant_id" => builder = builder.with_tenant_id(value),
                "client_id" => builder = builder.with_client_id(value),
                "client_secret" => builder = builder.with_client_secret(value),
                "use_fabric_endpoint" => {
                    use_fabric_endpoint = value.eq_ignore_ascii_case("true");
                    builder = builder.with_use_fabric_endpoint(use_fabric_endpoint);
                }
                "endpoint" => {
                    custom_endpoint = Some(value);
                    builder = builder.with_endpoint(value.clone());
                }
                _ => warn!("Unknown Azure option: {}", key),
            }
        }

        let store = builder.build().map_err(|e| {
            StorageError::ConfigError(format!("Failed to create Azure store: {}", e))
        })?;

        // abfss://<container>@<account>.<endpoint>
        let base_url = match custom_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => {
                let endpoint_domain = if use_fabric_endpoint {
                    "dfs.fabric.microsoft.com"
                } else {
                    "dfs.core.windows.net"
                };
                format!("abfss://{}@{}.{}", container, account_name, endpoint_domain)
            }
        };

        Ok((Box::new(store), base_url))
    }

    fn build_gcs_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = GoogleCloudStorageBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let mut bucket: Option<&String> = None;

        for (key, value) in config.backend_options() {
            match key.as_str() {
                "bucket" => {
                    bucket = Some(value);
                    builder = builder.with_bucket_name(value);
                }
                "service_account_key_path" => builder = builder.with_service_account_path(value),
                "service_account_key" => builder = builder.with_service_account_key(value),
                _ => warn!("Unknown GCS option: {}", key),
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create GCS store: {}", e)))?;

        let base_url = bucket
            .map(|bucket_name| format!("gs://{}", bucket_name))
            .unwrap_or_else(|| "gs://".to_string());

        Ok((Box::new(store), base_url))
    }

    fn to_file_metadata(meta: ObjectMeta) -> FileMetadata {
        FileMetadata {
            path: meta.location.to_string(),
            size: meta.size,
            last_modified: Some(meta.last_modified),
        }
    }
}

impl Debug for ObjectStoreProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreProvider")
            .field("storage_type", &self.config.storage_type)
            .field("base_path", &self.base_path)
            .finish()
    }
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    async fn validate_connection(&self, path: &str) -> StorageResult<()> {
        let prefix = string_to_path(path);
        let listing = self
            .store
            .list_with_delimiter(Some(&prefix))
            .await
            .map_err(|e| {
                StorageError::ConnectionError(format!("Failed to access path '{}': {}", path, e))
            })?;

        if listing.objects.is_empty() && listing.common_prefixes.is_empty() {
            return Err(StorageError::ConnectionError(format!(
                "Path '{}' is empty or does not exist under {}",
                path, self.base_path
            )));
        }
        debug!("Validated connection, path={}", path);
        Ok(())
    }

    async fn list_files(&self, path: &str, recursive: bool) -> StorageResult<Vec<FileMetadata>> {
        let store = Arc::clone(&self.store);
        let files = self
            .retry_policy
            .retry(&format!("list_files({})", path), || {
                let store = Arc::clone(&store);
                async move {
                    let prefix = string_to_path(path);
                    if recursive {
                        let mut files = Vec::new();
                        let mut stream = store.list(Some(&prefix));
                        while let Some(meta) = stream.next().await {
                            files.push(Self::to_file_metadata(meta?));
                        }
                        Ok::<_, StorageError>(files)
                    } else {
                        let listing = store.list_with_delimiter(Some(&prefix)).await?;
                        Ok(listing
                            .objects
                            .into_iter()
                            .map(Self::to_file_metadata)
                            .collect())
                    }
                }
            })
            .await?;

        info!(
            "Listed path={}, recursive={}, file_count={}",
            path,
            recursive,
            files.len()
        );
        Ok(files)
    }

    async fn read_file(&self, path: &str) -> StorageResult<Bytes> {
        let location = string_to_path(path);
        let bytes = self.store.get(&location).await?.bytes().await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, contents: &[u8]) {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    async fn local_provider(dir: &TempDir) -> ObjectStoreProvider {
        let config = StorageConfig::local().with_option("path", dir.path().to_string_lossy());
        ObjectStoreProvider::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_local_requires_path() {
        let err = ObjectStoreProvider::new(StorageConfig::local())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("requires 'path'"));
    }

    #[tokio::test]
    async fn test_local_rejects_missing_dir() {
        let config = StorageConfig::local().with_option("path", "/definitely/not/here/lake");
        let err = ObjectStoreProvider::new(config).await.unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_invalid_endpoint_rejected() {
        let config = StorageConfig::aws()
            .with_option("bucket", "lake")
            .with_option("endpoint", "not a url");
        let err = ObjectStoreProvider::new(config).await.unwrap_err();
        assert!(matches!(err, StorageError::UrlParseError(_)));
    }

    #[tokio::test]
    async fn test_azure_requires_account() {
        let config = StorageConfig::azure().with_option("container", "lake");
        let err = ObjectStoreProvider::new(config).await.unwrap_err();
        assert!(err.to_string().contains("account_name"));
    }

    #[tokio::test]
    async fn test_list_files_recursive_and_flat() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/part-0.parquet", b"abc");
        write(&dir, "sales/day=Mon/part-1.parquet", b"abcdef");
        let provider = local_provider(&dir).await;

        let mut all = provider.list_files("sales", true).await.unwrap();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].path, "sales/day=Mon/part-1.parquet");
        assert_eq!(all[0].size, 6);
        assert_eq!(all[1].size, 3);

        let flat = provider.list_files("sales", false).await.unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].path, "sales/part-0.parquet");
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/_delta_log/00000000000000000000.json", b"{}\n");
        let provider = local_provider(&dir).await;

        let bytes = provider
            .read_file("sales/_delta_log/00000000000000000000.json")
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), b"{}\n");
        assert!(provider.read_file("sales/missing.json").await.is_err());
    }

    #[tokio::test]
    async fn test_validate_connection() {
        let dir = TempDir::new().unwrap();
        write(&dir, "sales/part-0.parquet", b"abc");
        let provider = local_provider(&dir).await;

        assert!(provider.validate_connection("sales").await.is_ok());
        let err = provider.validate_connection("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::ConnectionError(_)));
    }
}
