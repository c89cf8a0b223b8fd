//! # modelgate
//!
//! Quota-aware model selection and fallback-retry dispatch for rate-limited
//! generation APIs.
//!
//! ## Overview
//!
//! modelgate sits in front of an external generation API whose models each
//! carry independent per-minute and per-day call budgets. For every request
//! it picks the highest-priority backend currently under quota, attempts the
//! call, and on overload transparently retries against other eligible
//! backends — bounded, distinct, in priority order — then records exactly one
//! attempt in a shared usage ledger.
//!
//! ## Core Philosophy
//!
//! - **Ledger as source of truth**: quota counts come from a shared,
//!   external append-only log, so all concurrent dispatch cycles across all
//!   processes spend against one global budget per backend. Admission is
//!   eventually consistent by design (no reserve-then-commit).
//! - **Fail open**: an unreachable model registry or a degraded ledger read
//!   loosens admission instead of refusing service.
//! - **Classify, then retry**: only overload-class failures (429/503) move to
//!   the next backend; fatal upstream errors stop the cycle immediately.
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Backend pool, quota ceilings, availability filtering |
//! | [`ledger`] | Usage ledger trait, in-memory and PostgREST stores |
//! | [`dispatch`] | Quota-aware selector and fallback retry executor |
//! | [`upstream`] | Generation API client (listing + generateContent) |
//! | [`structured`] | Candidate extraction and product card parsing |
//! | [`prompt`] | Generation prompt construction |
//! | [`service`] | axum HTTP surface with permissive CORS |
//! | [`config`] | Environment-driven configuration |

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod prompt;
pub mod service;
pub mod structured;
pub mod upstream;

// Re-export main types for convenience
pub use catalog::{Availability, BackendCatalog, BackendSpec, DEFAULT_CATALOG};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{Error, ErrorContext};
pub use ledger::{AttemptStatus, InMemoryLedger, RestLedger, UsageLedger};
pub use structured::ProductCard;
pub use upstream::{GenerationUpstream, HttpUpstream};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
