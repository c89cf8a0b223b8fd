//! Availability filtering: which catalog entries are currently callable at
//! all, independent of quota.
//!
//! The live registry snapshot comes from the upstream model-listing endpoint
//! once per dispatch. When that fetch fails the filter fails open — quota
//! logic still runs against the full catalog rather than refusing service.

use std::collections::HashSet;

use super::BackendCatalog;

/// Snapshot of the backends the upstream currently offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The existence list could not be fetched (or came back empty).
    /// Treated as "no information": every catalog entry is considered live.
    Unknown,
    /// Normalized live backend names as reported by the upstream.
    Known(Vec<String>),
}

impl Availability {
    /// Build from a fetched name list, collapsing an empty list to `Unknown`.
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            Availability::Unknown
        } else {
            Availability::Known(names)
        }
    }
}

/// Return the set of catalog entry names considered callable.
///
/// A catalog entry is callable iff some live name *contains* the entry's name
/// as a substring. The loose match tolerates upstream versioned or suffixed
/// naming (`gemini-2.0-flash-001`) without requiring an exact registry; it
/// also accepts the false-positive risk for overlapping names.
pub fn filter_callable(catalog: &BackendCatalog, live: &Availability) -> HashSet<String> {
    match live {
        Availability::Unknown => catalog
            .entries()
            .iter()
            .map(|e| e.name.clone())
            .collect(),
        Availability::Known(names) => catalog
            .entries()
            .iter()
            .filter(|e| names.iter().any(|live_name| live_name.contains(&e.name)))
            .map(|e| e.name.clone())
            .collect(),
    }
}
