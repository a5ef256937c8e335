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

//! Health analysis engine.
//!
//! Pure analyzers ([`reconcile`], [`orphan`], [`skew`], [`size`], [`recommend`])
//! over the records in [`model`], orchestrated by [`HealthAnalyzer`].

pub mod analyze;
pub mod anomaly;
pub mod common;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod orphan;
pub mod recommend;
pub mod reconcile;
pub mod size;
pub mod skew;

pub use analyze::{analyze_snapshot, HealthAnalyzer, HealthAnalyzerBuilder};
pub use anomaly::IntegrityAnomaly;
pub use config::AnalysisConfig;
pub use error::{AnalyzeError, DataLoadError, LogReadError, StorageAccessError};
