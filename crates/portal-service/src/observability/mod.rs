//! Observability for the portal service.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit field
//! allow-listing. Fields fall in three groups:
//! - **SAFE**: logged as-is (outcomes, reasons, numeric ids)
//! - **HASHED**: logged only through [`hash_for_correlation`] (emails)
//! - **NEVER**: passwords, tokens, signing keys

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// One-way and truncated: enough to follow one account through the logs
/// without storing its email in plaintext.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}
