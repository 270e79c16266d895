use std::{future::Future, time::Instant};

use kg_observability as observability;

use crate::error::{BackendError, Result};

/// Times one backend operation and records its outcome.
pub(crate) async fn observe<T>(
    backend: &'static str,
    op: &'static str,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    let started = Instant::now();
    let result = operation.await;
    record_backend_operation(backend, op, result.as_ref().err(), started);
    result
}

fn record_backend_operation(
    backend: &str,
    op: &str,
    error: Option<&BackendError>,
    started: Instant,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_kind = error.map_or("none", BackendError::kind);

    observability::record_backend_operation(backend, op, status, error_kind, started.elapsed());
}

pub(crate) fn record_query_bytes(backend: &str, op: &str, query: &str) {
    observability::record_backend_query_bytes(backend, op, query.len());
}

pub(crate) fn record_result_rows(backend: &str, op: &str, rows: usize) {
    observability::record_backend_result_rows(backend, op, rows);
}

pub(crate) fn record_connection(backend: &str, event: &str) {
    observability::record_backend_connection(backend, event);
}
