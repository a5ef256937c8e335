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

//! Retry with exponential backoff for storage collaborators.
//!
//! The analysis engine itself never retries; a failed collaborator call
//! propagates straight to the caller. Retrying transient network errors is the
//! job of the storage layer, which wraps its listing calls with [`RetryPolicy`].

use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Error fragments that mark a failure as transient.
const TRANSIENT_ERROR_MARKERS: [&str; 4] =
    ["ConnectionReset", "BrokenPipe", "Interrupted", "TimedOut"];

/// Exponential backoff policy: `base_backoff * 2^attempt`, capped at `max_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Backoff to wait after the given (zero-based) failed attempt.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails with a non-transient error, or
    /// `max_retries` retries have been spent. The last error is returned.
    pub async fn retry<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        "Retryable error in {} (attempt {}/{}), backoff_ms={}: {:?}",
                        operation_name,
                        attempt + 1,
                        self.max_retries,
                        backoff.as_millis(),
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Whether an error looks like a transient connection problem.
pub fn is_transient<E: Error>(error: &E) -> bool {
    let error_msg = format!("{:?}", error);
    TRANSIENT_ERROR_MARKERS
        .iter()
        .any(|marker| error_msg.contains(marker))
}
