//! Shared metrics recording for store operations.

use std::time::Instant;

/// Records operation metrics for dataset store operations.
///
/// This function records two metrics for each operation:
/// 1. `storage_operations_total` - Counter for operation count by status
/// 2. `storage_operation_duration_ms` - Histogram for operation latency
///
/// # Arguments
///
/// * `operation` - Operation name (e.g., "store", "get", "update", "delete")
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - Operation status ("success" or "error")
pub fn record_operation_metrics(operation: &'static str, start: Instant, status: &'static str) {
    metrics::counter!(
        "storage_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Maps a result to the status label used by [`record_operation_metrics`].
pub const fn status_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
