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

//! # Delta Pulse
//!
//! Health analysis for Delta Lake tables on local filesystems and cloud object
//! stores (AWS S3, Azure Data Lake, GCS).
//!
//! The transaction log is replayed on top of its latest checkpoint into the
//! live file set and cross-checked against what is physically stored,
//! producing a [`HealthReport`] with:
//!
//! - **Operation history**: writes, deletes, merges, optimizes and vacuums
//! - **Orphan files**: stored data files no live log entry references
//! - **Partition skew**: deviation of per-partition record counts from the mean
//! - **Size metrics**: table vs folder size, small files, average file size
//! - **Recommendations**: vacuum / optimize flags, a 0-100 health score and advice
//! - **Integrity anomalies**: version gaps, duplicate adds, unknown removes,
//!   missing files, a log truncated without checkpoint
//!
//! Nothing is ever written to the table; all advice is for the operator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use delta_pulse::{AnalysisConfig, HealthAnalyzer, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = StorageConfig::aws()
//!     .with_option("bucket", "my-bucket")
//!     .with_option("region", "us-east-1");
//!
//! let analyzer = HealthAnalyzer::builder(config).build().await?;
//! let report = analyzer
//!     .analyze("warehouse/sales", &AnalysisConfig::default())
//!     .await?;
//!
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! Callers with their own log/listing sources can implement the traits in
//! [`reader`] and pass them to [`HealthAnalyzer::new`], or run
//! [`analyze_snapshot`] over records they already hold.
//!
//! ## Modules
//!
//! - [`analyze`] - The analysis engine and report model
//! - [`reader`] - Collaborator traits and their Delta Lake implementations
//! - [`storage`] - Cloud storage abstraction layer
//! - [`util`] - Timing, path and retry helpers

pub mod analyze;
pub mod reader;
pub mod storage;
pub mod util;

// Re-export commonly used types
pub use analyze::metrics::{HealthMetrics, HealthReport, HealthStatus};
pub use analyze::model::{
    Checkpoint, CommitRecord, FileRef, LogSnapshot, Operation, PartitionStats, PhysicalFile,
};
pub use analyze::{
    analyze_snapshot, AnalysisConfig, AnalyzeError, HealthAnalyzer, IntegrityAnomaly,
};
pub use reader::{LogReader, PartitionLoader, StorageLister};
pub use storage::StorageConfig;
