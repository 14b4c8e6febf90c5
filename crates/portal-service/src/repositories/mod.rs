//! Database access layer.
//!
//! Every query goes through [`timed`] so `portal_db_query_duration_seconds`
//! and `portal_db_queries_total` cover the whole layer.

use crate::observability::metrics::record_db_query;
use std::future::Future;
use std::time::Instant;

pub mod audit_logs;
pub mod portal;
pub mod projects;
pub mod users;

/// Await a query, recording its latency and outcome by operation and table.
pub(crate) async fn timed<T, F>(
    operation: &'static str,
    table: &'static str,
    query: F,
) -> Result<T, sqlx::Error>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;

    let status = if result.is_ok() { "success" } else { "error" };
    record_db_query(operation, table, status, start.elapsed());

    result
}
