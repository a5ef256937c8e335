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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::error::StorageError;

/// Options consumed by the client/retry layer rather than by the backend builders.
pub const CONNECTION_OPTION_KEYS: [&str; 6] = [
    "timeout",
    "connect_timeout",
    "max_retries",
    "retry_timeout",
    "pool_idle_timeout",
    "pool_max_idle_per_host",
];

/// Storage provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Local filesystem storage
    Local,
    /// AWS S3 storage
    Aws,
    /// Azure Data Lake Storage
    Azure,
    /// Google Cloud Storage
    Gcs,
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "file" => Ok(StorageType::Local),
            "aws" | "s3" => Ok(StorageType::Aws),
            "azure" | "adls" | "abfss" => Ok(StorageType::Azure),
            "gcs" | "gcp" | "gs" => Ok(StorageType::Gcs),
            other => Err(StorageError::ConfigError(format!(
                "Unknown storage type: {}",
                other
            ))),
        }
    }
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Local => "local",
            StorageType::Aws => "aws",
            StorageType::Azure => "azure",
            StorageType::Gcs => "gcs",
        }
    }
}

/// Generic configuration for storage providers using object_store
///
/// Provider-specific options are kept in a string map and handed to the
/// object_store builders, so any key object_store understands for the backend
/// (e.g. `bucket`, `region`, `access_key_id`, `account_name`, `client_secret`,
/// `service_account_key`) can be passed through unchanged. The local backend
/// only needs `path`.
///
/// # Examples
///
/// ```
/// use delta_pulse::storage::StorageConfig;
///
/// let local = StorageConfig::local().with_option("path", "/tmp/lake");
///
/// let s3 = StorageConfig::aws()
///     .with_option("bucket", "my-bucket")
///     .with_option("region", "us-east-1");
/// assert_eq!(s3.get_option("bucket").map(String::as_str), Some("my-bucket"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Provider-specific configuration options
    #[serde(default = "StorageConfig::default_options")]
    pub options: HashMap<String, String>,
}

impl StorageConfig {
    pub fn new(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            options: Self::default_options(),
        }
    }

    /// Create a configuration from a textual storage type ("local", "s3", "azure", "gcs", ...).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigError`] for an unknown storage type.
    pub fn parse(storage_type: &str) -> Result<Self, StorageError> {
        Ok(Self::new(storage_type.parse()?))
    }

    pub fn local() -> Self {
        Self::new(StorageType::Local)
    }

    pub fn aws() -> Self {
        Self::new(StorageType::Aws)
    }

    pub fn azure() -> Self {
        Self::new(StorageType::Azure)
    }

    pub fn gcs() -> Self {
        Self::new(StorageType::Gcs)
    }

    /// Default timeout, retry and connection pool settings shared by all backends.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "1200"),
            ("connect_timeout", "30"),
            ("max_retries", "20"),
            ("retry_timeout", "1200"),
            ("pool_idle_timeout", "15"),
            ("pool_max_idle_per_host", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Options meant for the backend builder, without the connection/retry settings.
    pub fn backend_options(&self) -> impl Iterator<Item = (&String, &String)> {
        self.options
            .iter()
            .filter(|(k, _)| !CONNECTION_OPTION_KEYS.contains(&k.as_str()))
    }

    pub fn storage_type_str(&self) -> &str {
        self.storage_type.as_str()
    }
}
