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
use tracing::warn;

use super::common::constants::*;
use super::error::AnalyzeError;

/// Thresholds steering the analyzers and the recommendation policy.
///
/// Passed explicitly into every analysis; there is no global state.
///
/// ```
/// use delta_pulse::AnalysisConfig;
///
/// let config = AnalysisConfig::default()
///     .with_skew_threshold(0.8)
///     .with_orphan_ratio_threshold(0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub skew_threshold: f64,
    pub small_file_threshold_bytes: u64,
    pub small_file_count_threshold: usize,
    pub orphan_byte_threshold: u64,
    /// Orphan bytes / folder bytes must exceed this when set.
    pub orphan_ratio_threshold: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            skew_threshold: DEFAULT_SKEW_THRESHOLD,
            small_file_threshold_bytes: DEFAULT_SMALL_FILE_THRESHOLD_BYTES,
            small_file_count_threshold: DEFAULT_SMALL_FILE_COUNT_THRESHOLD,
            orphan_byte_threshold: DEFAULT_ORPHAN_BYTE_THRESHOLD,
            orphan_ratio_threshold: None,
        }
    }
}

fn parse_option<T: FromStr>(key: &str, value: &str) -> Result<T, AnalyzeError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        AnalyzeError::InvalidConfig(format!("option {}={} is invalid: {}", key, value, e))
    })
}

impl AnalysisConfig {
    pub fn with_skew_threshold(mut self, skew_threshold: f64) -> Self {
        self.skew_threshold = skew_threshold;
        self
    }

    pub fn with_small_file_threshold_bytes(mut self, bytes: u64) -> Self {
        self.small_file_threshold_bytes = bytes;
        self
    }

    pub fn with_small_file_count_threshold(mut self, count: usize) -> Self {
        self.small_file_count_threshold = count;
        self
    }

    pub fn with_orphan_byte_threshold(mut self, bytes: u64) -> Self {
        self.orphan_byte_threshold = bytes;
        self
    }

    pub fn with_orphan_ratio_threshold(mut self, ratio: f64) -> Self {
        self.orphan_ratio_threshold = Some(ratio);
        self
    }

    /// Build a configuration from a string option map, starting from the defaults.
    ///
    /// Unknown keys are logged and skipped. An empty `orphan_ratio_threshold`
    /// clears the ratio check.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::InvalidConfig`] when a value does not parse or
    /// the resulting configuration fails [`AnalysisConfig::validate`].
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self, AnalyzeError> {
        let mut config = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "skew_threshold" => config.skew_threshold = parse_option(key, value)?,
                "small_file_threshold_bytes" => {
                    config.small_file_threshold_bytes = parse_option(key, value)?
                }
                "small_file_count_threshold" => {
                    config.small_file_count_threshold = parse_option(key, value)?
                }
                "orphan_byte_threshold" => {
                    config.orphan_byte_threshold = parse_option(key, value)?
                }
                "orphan_ratio_threshold" if value.trim().is_empty() => {
                    config.orphan_ratio_threshold = None
                }
                "orphan_ratio_threshold" => {
                    config.orphan_ratio_threshold = Some(parse_option(key, value)?)
                }
                _ => warn!("Unknown analysis option: {}", key),
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that cannot be compared against (negative or NaN).
    pub fn validate(&self) -> Result<(), AnalyzeError> {
        if !self.skew_threshold.is_finite() || self.skew_threshold < 0.0 {
            return Err(AnalyzeError::InvalidConfig(format!(
                "skew_threshold must be a non-negative number, got {}",
                self.skew_threshold
            )));
        }
        if let Some(ratio) = self.orphan_ratio_threshold {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(AnalyzeError::InvalidConfig(format!(
                    "orphan_ratio_threshold must be a non-negative number, got {}",
                    ratio
                )));
            }
        }
        Ok(())
    }
}
