//! Quota-aware backend selection.
//!
//! Walks the catalog in priority order and returns the first backend that is
//! callable and under both rolling quota ceilings. Counts come from the
//! shared ledger so every concurrent dispatch cycle, across all processes,
//! spends against one global budget per backend. Selection never fails: when
//! nothing qualifies, the catalog's designated fallback is returned
//! regardless of its own quota state — the quota is advisory for admission
//! ordering, not a circuit breaker for the last resort.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::catalog::BackendCatalog;
use crate::ledger::UsageLedger;

/// Rolling window for the per-minute ceiling.
const MINUTE_WINDOW_SECS: i64 = 60;
/// Rolling window for the per-day ceiling.
const DAY_WINDOW_HOURS: i64 = 24;

/// Pick the highest-priority backend that is callable and under quota.
///
/// A ledger read error is treated as zero usage for that window: a degraded
/// ledger must not refuse service, it only loosens admission.
pub async fn select_backend(
    catalog: &BackendCatalog,
    available: &HashSet<String>,
    ledger: &dyn UsageLedger,
) -> String {
    for candidate in catalog.entries() {
        if !available.contains(&candidate.name) {
            debug!(backend = candidate.name.as_str(), "skipping: not in live registry");
            continue;
        }

        // Windows are computed at query time, half-open (`>=` on the boundary).
        let minute_ago = Utc::now() - Duration::seconds(MINUTE_WINDOW_SECS);
        let rpm_count = match ledger.count_since(&candidate.name, minute_ago).await {
            Ok(n) => n,
            Err(e) => {
                warn!(backend = candidate.name.as_str(), error = %e, "rpm count failed, assuming 0");
                0
            }
        };
        if rpm_count >= candidate.rpm_limit {
            info!(
                backend = candidate.name.as_str(),
                used = rpm_count,
                limit = candidate.rpm_limit,
                "skipping: rpm limit reached"
            );
            continue;
        }

        let day_ago = Utc::now() - Duration::hours(DAY_WINDOW_HOURS);
        let rpd_count = match ledger.count_since(&candidate.name, day_ago).await {
            Ok(n) => n,
            Err(e) => {
                warn!(backend = candidate.name.as_str(), error = %e, "rpd count failed, assuming 0");
                0
            }
        };
        if rpd_count >= candidate.rpd_limit {
            info!(
                backend = candidate.name.as_str(),
                used = rpd_count,
                limit = candidate.rpd_limit,
                "skipping: rpd limit reached"
            );
            continue;
        }

        return candidate.name.clone();
    }

    info!(
        backend = catalog.fallback(),
        "no candidate under quota, using designated fallback"
    );
    catalog.fallback().to_string()
}
