//! In-memory ledger for tests and single-process runs.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AttemptStatus, LedgerEntry, UsageLedger};
use crate::Result;

/// Vec-backed ledger. Not durable and not shared across processes, so it
/// cannot provide the global quota contract of the REST ledger — use it for
/// tests and local development only.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry with an explicit timestamp. Lets tests place attempts
    /// exactly on or around window boundaries.
    pub fn record_at(
        &self,
        backend: &str,
        status: AttemptStatus,
        detail: Option<&str>,
        recorded_at: DateTime<Utc>,
    ) {
        let mut entries = self.entries.write().unwrap();
        entries.push(LedgerEntry {
            backend: backend.to_string(),
            status,
            detail: detail.map(str::to_string),
            recorded_at,
        });
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[async_trait]
impl UsageLedger for InMemoryLedger {
    async fn count_since(&self, backend: &str, since: DateTime<Utc>) -> Result<u64> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.backend == backend && e.recorded_at >= since)
            .count() as u64)
    }

    async fn record(
        &self,
        backend: &str,
        status: AttemptStatus,
        detail: Option<&str>,
    ) -> Result<()> {
        self.record_at(backend, status, detail, Utc::now());
        Ok(())
    }
}
