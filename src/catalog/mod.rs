//! Backend catalog: the static, pre-ordered pool of candidate generation
//! models and their quota ceilings.
//!
//! The catalog is read-only, process-wide state. Priority is the iteration
//! order — earlier entries are tried first. Each entry carries two rolling
//! quota ceilings (requests per minute, requests per day) that the selector
//! checks against the shared usage ledger.

pub mod availability;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub use availability::{filter_callable, Availability};

/// One candidate backend (upstream generation model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Provider-native model name, e.g. "gemini-2.0-flash".
    pub name: String,
    /// Maximum calls within the last rolling minute.
    pub rpm_limit: u64,
    /// Maximum calls within the last rolling day.
    pub rpd_limit: u64,
}

impl BackendSpec {
    pub fn new(name: impl Into<String>, rpm_limit: u64, rpd_limit: u64) -> Self {
        Self {
            name: name.into(),
            rpm_limit,
            rpd_limit,
        }
    }
}

/// Ordered pool of candidate backends plus the designated final fallback.
///
/// Invariant: entry names are unique and the vector is already in priority
/// order (no separate rank field, no sorting at selection time).
#[derive(Debug, Clone)]
pub struct BackendCatalog {
    entries: Vec<BackendSpec>,
    /// Always-attempt backend returned when every entry is filtered out or
    /// over quota. Quotas order admission; they do not gate this last resort.
    fallback: String,
}

impl BackendCatalog {
    pub fn new(entries: Vec<BackendSpec>, fallback: impl Into<String>) -> Self {
        Self {
            entries,
            fallback: fallback.into(),
        }
    }

    /// Entries in priority order.
    pub fn entries(&self) -> &[BackendSpec] {
        &self.entries
    }

    /// Name of the designated final fallback backend.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Default catalog: the flash-tier model ladder with its per-model budgets.
/// The last entry doubles as the designated fallback — lowest priority,
/// largest daily budget.
pub static DEFAULT_CATALOG: Lazy<BackendCatalog> = Lazy::new(|| {
    BackendCatalog::new(
        vec![
            BackendSpec::new("gemini-3-flash-preview", 5, 20),
            BackendSpec::new("gemini-2.5-flash", 5, 20),
            BackendSpec::new("gemini-2.5-flash-lite", 10, 20),
            BackendSpec::new("gemini-2.0-flash", 5, 20),
            BackendSpec::new("gemini-2.0-flash-lite", 10, 20),
            BackendSpec::new("gemini-1.5-flash", 15, 1500),
        ],
        "gemini-1.5-flash",
    )
});
