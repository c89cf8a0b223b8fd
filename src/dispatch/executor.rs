//! Fallback retry execution.
//!
//! One dispatch cycle gets a short ordered queue of distinct backends: the
//! selected backend first, then the next available catalog entries, capped at
//! [`MAX_ATTEMPTS`] to bound worst-case latency and the quota blast radius.
//! Attempts run in order with no inter-attempt delay. Overload failures
//! (HTTP 429/503) move on to the next queued backend; fatal upstream statuses
//! stop the cycle immediately — a bad request or auth failure will not
//! improve on another backend.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::BackendCatalog;
use crate::error::is_overload_status;
use crate::ledger::AttemptStatus;
use crate::upstream::GenerationUpstream;
use crate::Error;

/// Upper bound on backends attempted within one dispatch cycle.
pub const MAX_ATTEMPTS: usize = 3;

/// Result of one full dispatch cycle, consumed by the outcome recorder.
#[derive(Debug)]
pub struct DispatchOutcome {
    /// The backend that succeeded, or the last one attempted.
    pub attempted_backend: String,
    pub status: AttemptStatus,
    pub detail: Option<String>,
    pub payload: Option<Value>,
}

impl DispatchOutcome {
    fn success(backend: &str, payload: Value) -> Self {
        Self {
            attempted_backend: backend.to_string(),
            status: AttemptStatus::Success,
            detail: None,
            payload: Some(payload),
        }
    }

    fn failure(backend: &str, status: AttemptStatus, detail: String) -> Self {
        Self {
            attempted_backend: backend.to_string(),
            status,
            detail: Some(detail),
            payload: None,
        }
    }
}

/// Build the retry queue: the selected backend first, then other available
/// backends in catalog priority order, distinct, up to [`MAX_ATTEMPTS`].
///
/// The selected backend is queued even when it is absent from `available`
/// (the selector's forced-fallback clause can pick a filtered-out backend).
pub fn build_queue(
    selected: &str,
    catalog: &BackendCatalog,
    available: &HashSet<String>,
) -> Vec<String> {
    let mut queue = vec![selected.to_string()];
    for entry in catalog.entries() {
        if queue.len() >= MAX_ATTEMPTS {
            break;
        }
        if entry.name != selected && available.contains(&entry.name) {
            queue.push(entry.name.clone());
        }
    }
    queue
}

/// Drive the queue against the upstream until first success, a fatal
/// failure, or exhaustion.
pub async fn execute(
    selected: &str,
    catalog: &BackendCatalog,
    available: &HashSet<String>,
    upstream: &dyn GenerationUpstream,
    prompt: &str,
) -> DispatchOutcome {
    let queue = build_queue(selected, catalog, available);
    let last = queue.len() - 1;

    for (attempt, backend) in queue.iter().enumerate() {
        let start = std::time::Instant::now();
        match upstream.generate(backend, prompt).await {
            Ok(payload) => {
                info!(
                    backend = backend.as_str(),
                    attempt = attempt + 1,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "generation succeeded"
                );
                return DispatchOutcome::success(backend, payload);
            }
            Err(Error::Remote {
                status,
                class,
                message,
                ..
            }) if is_overload_status(status) => {
                if attempt == last {
                    info!(
                        backend = backend.as_str(),
                        http_status = status,
                        attempt = attempt + 1,
                        "overloaded on final queue entry, surfacing error"
                    );
                    let final_status = if status == 429 {
                        AttemptStatus::Error429
                    } else {
                        AttemptStatus::ErrorOther
                    };
                    return DispatchOutcome::failure(backend, final_status, message);
                }
                warn!(
                    backend = backend.as_str(),
                    http_status = status,
                    error_class = class.as_str(),
                    attempt = attempt + 1,
                    "overloaded, trying next queued backend"
                );
            }
            Err(Error::Remote {
                status, message, ..
            }) => {
                // Fatal upstream status: not a capacity problem, retrying a
                // different backend will not help.
                info!(
                    backend = backend.as_str(),
                    http_status = status,
                    attempt = attempt + 1,
                    "fatal upstream error, not retrying"
                );
                return DispatchOutcome::failure(backend, AttemptStatus::ErrorOther, message);
            }
            Err(e) => {
                // Transport-level failure (connect, timeout, body decode).
                if attempt == last {
                    return DispatchOutcome::failure(
                        backend,
                        AttemptStatus::ErrorOther,
                        e.to_string(),
                    );
                }
                warn!(
                    backend = backend.as_str(),
                    error = %e,
                    attempt = attempt + 1,
                    "transport failure, trying next queued backend"
                );
            }
        }
    }

    // Defensive: every branch above returns on the last queue entry.
    DispatchOutcome::failure(
        queue.last().map(String::as_str).unwrap_or(selected),
        AttemptStatus::ErrorOther,
        "all retries failed".to_string(),
    )
}
