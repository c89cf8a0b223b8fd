//! Dispatch cycle orchestration.
//!
//! One cycle: fetch the live registry (fail open) → filter the catalog →
//! quota-aware selection → fallback retry execution → exactly one ledger
//! record → payload or error. Cycles are independent tokio tasks with no
//! in-process coordination; the shared ledger is the only cross-cycle state.

pub mod executor;
pub mod selector;

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{filter_callable, BackendCatalog};
use crate::ledger::UsageLedger;
use crate::upstream::GenerationUpstream;
use crate::{Error, Result};

pub use executor::{build_queue, execute, DispatchOutcome, MAX_ATTEMPTS};
pub use selector::select_backend;

/// Quota-aware dispatcher over a backend catalog, a shared usage ledger, and
/// an upstream generation API.
pub struct Dispatcher {
    catalog: BackendCatalog,
    ledger: Arc<dyn UsageLedger>,
    upstream: Arc<dyn GenerationUpstream>,
}

impl Dispatcher {
    pub fn new(
        catalog: BackendCatalog,
        ledger: Arc<dyn UsageLedger>,
        upstream: Arc<dyn GenerationUpstream>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            upstream,
        }
    }

    pub fn catalog(&self) -> &BackendCatalog {
        &self.catalog
    }

    /// Run one full dispatch cycle for a prompt.
    ///
    /// Returns the upstream payload on success. On failure the ledger entry
    /// is written *before* the error is surfaced, so every attempt is
    /// observable for quota accounting.
    pub async fn dispatch(&self, prompt: &str) -> Result<serde_json::Value> {
        let cycle_id = Uuid::new_v4();

        // Availability is fetched fresh per cycle and never cached.
        let live = self.upstream.list_backends().await;
        let available = filter_callable(&self.catalog, &live);

        let selected = select_backend(&self.catalog, &available, self.ledger.as_ref()).await;
        info!(
            cycle_id = %cycle_id,
            backend = selected.as_str(),
            available = available.len(),
            "selected backend for generation"
        );

        let outcome = execute(
            &selected,
            &self.catalog,
            &available,
            self.upstream.as_ref(),
            prompt,
        )
        .await;

        // Exactly one ledger write per cycle, success or failure. A failed
        // write degrades quota accounting but must not clobber the outcome.
        if let Err(e) = self
            .ledger
            .record(
                &outcome.attempted_backend,
                outcome.status,
                outcome.detail.as_deref(),
            )
            .await
        {
            warn!(cycle_id = %cycle_id, error = %e, "ledger record failed");
        }

        match outcome.payload {
            Some(payload) => Ok(payload),
            None => {
                let detail = outcome
                    .detail
                    .unwrap_or_else(|| "all retries failed".to_string());
                Err(Error::runtime_with_context(
                    detail,
                    crate::ErrorContext::new()
                        .with_details(format!("backend: {}", outcome.attempted_backend))
                        .with_source("dispatch"),
                ))
            }
        }
    }
}
