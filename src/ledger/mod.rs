//! Usage ledger: the append-only log of past call attempts that doubles as
//! the quota-accounting source of truth.
//!
//! Every dispatch cycle writes exactly one entry, success or failure — the
//! selector's quota math depends on total attempt counts, not just successes.
//! The ledger is the only shared mutable resource in the system; keeping it
//! external (durable, shared storage) means concurrent cycles coordinate
//! through it rather than through in-process locks. Two concurrent cycles can
//! both read an under-quota count and both insert, transiently exceeding a
//! ceiling: that soft-limit behavior is a property of the design, not a bug.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

pub use memory::InMemoryLedger;
pub use rest::RestLedger;

/// Final status of one dispatch cycle, as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    /// Upstream reported rate limiting (HTTP 429) on the final attempt.
    #[serde(rename = "error_429")]
    Error429,
    /// Any other failure (overload 503 at queue end, fatal status, transport).
    ErrorOther,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Success => "success",
            AttemptStatus::Error429 => "error_429",
            AttemptStatus::ErrorOther => "error_other",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptStatus::Success)
    }
}

/// One recorded attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub backend: String,
    pub status: AttemptStatus,
    pub detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only attempt log with rolling-window counting.
///
/// `count_since` must be an exact count of entries for `backend` recorded at
/// or after `since` (half-open window, `>=` on the boundary). Counts are
/// recomputed per selector invocation and never cached across invocations:
/// freshness over performance, since a miscount risks violating an external
/// quota contract.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    async fn count_since(&self, backend: &str, since: DateTime<Utc>) -> Result<u64>;

    async fn record(
        &self,
        backend: &str,
        status: AttemptStatus,
        detail: Option<&str>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings() {
        assert_eq!(AttemptStatus::Success.as_str(), "success");
        assert_eq!(AttemptStatus::Error429.as_str(), "error_429");
        assert_eq!(AttemptStatus::ErrorOther.as_str(), "error_other");
    }

    #[test]
    fn status_serde_wire_form() {
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Error429).unwrap(),
            "\"error_429\""
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::ErrorOther).unwrap(),
            "\"error_other\""
        );
        let back: AttemptStatus = serde_json::from_str("\"success\"").unwrap();
        assert!(back.is_success());
    }
}
