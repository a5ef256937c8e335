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

use std::collections::LinkedList;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tracing::info;

/// Stage timings collected while analyzing: `(stage name, start, duration)`.
pub type StageTimings<'a> = LinkedList<(&'a str, SystemTime, Duration)>;

/// Join a table location and a relative path with exactly one `/` between them.
pub fn join_path(table_path: &str, relative: &str) -> String {
    let root = table_path.trim_matches('/');
    let relative = relative.trim_start_matches('/');
    if root.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", root, relative)
    }
}

/// Express a storage path relative to the table root.
///
/// Storage listings return paths relative to the provider's base path, while
/// the transaction log records them relative to the table directory. Paths
/// outside the table root are returned unchanged (minus leading slashes).
pub fn relative_to_table(table_path: &str, path: &str) -> String {
    let root = table_path.trim_matches('/');
    let path = path.trim_start_matches('/');
    if root.is_empty() {
        return path.to_string();
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
        .to_string()
}

/// Wrapper function to measure duration of an async operation
pub async fn measure_dur_async<'a, F, Fut, T, E>(
    metric_name: &'a str,
    internal_metrics: &mut StageTimings<'a>,
    operation: F,
    trace_log_fn: Option<fn(&T) -> String>,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = SystemTime::now();
    let result = operation().await;
    let dur = start.elapsed().unwrap_or_else(|_| Duration::from_millis(0));
    internal_metrics.push_back((metric_name, start, dur));
    let log_line = result
        .as_ref()
        .ok()
        .and_then(|r| trace_log_fn.map(|f| f(r)))
        .unwrap_or_default();
    info!("{} | {}, took={}", metric_name, log_line, dur.as_millis());
    result
}

/// Wrapper function to measure duration of a synchronous operation
pub fn measure_dur<'a, F, T>(
    metric_name: &'a str,
    internal_metrics: &mut StageTimings<'a>,
    operation: F,
    trace_log_fn: Option<fn(&T) -> String>,
) -> T
where
    F: FnOnce() -> T,
{
    let start = SystemTime::now();
    let result = operation();
    let dur = start.elapsed().unwrap_or_else(|_| Duration::from_millis(0));
    internal_metrics.push_back((metric_name, start, dur));
    let log_line = trace_log_fn.map(|f| f(&result)).unwrap_or_default();
    info!("{} | {}, took={}", metric_name, log_line, dur.as_millis());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("tables/sales", "_delta_log"), "tables/sales/_delta_log");
        assert_eq!(join_path("/tables/sales/", "/_delta_log"), "tables/sales/_delta_log");
        assert_eq!(join_path("", "_delta_log"), "_delta_log");
    }

    #[test]
    fn test_relative_to_table_strips_root() {
        assert_eq!(
            relative_to_table("tables/sales", "tables/sales/day=Mon/part-0.parquet"),
            "day=Mon/part-0.parquet"
        );
        assert_eq!(
            relative_to_table("/tables/sales/", "tables/sales/part-0.parquet"),
            "part-0.parquet"
        );
    }

    #[test]
    fn test_relative_to_table_empty_root() {
        assert_eq!(relative_to_table("", "/part-0.parquet"), "part-0.parquet");
    }

    #[test]
    fn test_relative_to_table_does_not_strip_sibling_prefix() {
        // "sales_archive" shares a prefix with "sales" but is not inside it
        assert_eq!(
            relative_to_table("sales", "sales_archive/part-0.parquet"),
            "sales_archive/part-0.parquet"
        );
    }

    #[test]
    fn test_measure_dur_records_stage() {
        let mut timings = StageTimings::new();
        let value = measure_dur("sum", &mut timings, || 2 + 2, Some(|v: &i32| format!("v={}", v)));
        assert_eq!(value, 4);
        assert_eq!(timings.len(), 1);
        assert_eq!(timings.front().map(|(name, _, _)| *name), Some("sum"));
    }

    #[tokio::test]
    async fn test_measure_dur_async_propagates_error() {
        let mut timings = StageTimings::new();
        let result: Result<u8, String> = measure_dur_async(
            "failing",
            &mut timings,
            || async { Err("boom".to_string()) },
            None,
        )
        .await;
        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(timings.len(), 1);
    }
}
