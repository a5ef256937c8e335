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

//! Fatal errors of an analysis run.
//!
//! Each collaborator has its own error type so callers can tell which input
//! failed. [`AnalyzeError`] wraps them unchanged.

use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

macro_rules! collaborator_error {
    ($name:ident, $what:literal) => {
        #[derive(Error, Debug)]
        pub struct $name {
            pub table_path: String,
            pub message: String,
            #[source]
            pub source: Option<BoxError>,
        }

        impl $name {
            pub fn new(table_path: impl Into<String>, message: impl Into<String>) -> Self {
                Self {
                    table_path: table_path.into(),
                    message: message.into(),
                    source: None,
                }
            }

            pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
                self.source = Some(source.into());
                self
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} for table {}: {}", $what, self.table_path, self.message)
            }
        }
    };
}

collaborator_error!(LogReadError, "Failed to read transaction log");
collaborator_error!(StorageAccessError, "Failed to list storage");
collaborator_error!(DataLoadError, "Failed to load partition statistics");

/// Errors that abort an analysis. No partial report is produced.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    LogRead(#[from] LogReadError),

    #[error(transparent)]
    StorageAccess(#[from] StorageAccessError),

    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),

    #[error("Analysis task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_collaborator_error_message() {
        let err = LogReadError::new("tables/sales", "no commit files");
        assert_eq!(
            err.to_string(),
            "Failed to read transaction log for table tables/sales: no commit files"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_collaborator_error_source() {
        let err = StorageAccessError::new("tables/sales", "listing failed")
            .with_source(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("denied".to_string()));
    }

    #[test]
    fn test_analyze_error_is_transparent() {
        let err: AnalyzeError = DataLoadError::new("t", "missing stats").into();
        assert!(matches!(err, AnalyzeError::DataLoad(_)));
        assert_eq!(
            err.to_string(),
            "Failed to load partition statistics for table t: missing stats"
        );
    }
}
