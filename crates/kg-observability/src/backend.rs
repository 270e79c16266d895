use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_backend_operation(
    backend: &str,
    op: &str,
    status: &str,
    error_kind: &str,
    duration: Duration,
) {
    counter!(
        "kg_backend_operations_total",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string(),
        "error_kind" => error_kind.to_string()
    )
    .increment(1);
    histogram!(
        "kg_backend_operation_duration_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_backend_query_bytes(backend: &str, op: &str, bytes: usize) {
    counter!(
        "kg_backend_query_bytes_total",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .increment(bytes as u64);
}

pub fn record_backend_result_rows(backend: &str, op: &str, rows: usize) {
    histogram!(
        "kg_backend_result_rows",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .record(rows as f64);
}

pub fn record_backend_connection(backend: &str, event: &str) {
    counter!(
        "kg_backend_connection_events_total",
        "backend" => backend.to_string(),
        "event" => event.to_string()
    )
    .increment(1);
}
