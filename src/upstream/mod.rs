//! Upstream generation API boundary.
//!
//! The dispatcher drives the upstream through this narrow trait: an
//! existence-list fetch (which backends exist at all right now) and a
//! per-backend generation call. The HTTP implementation lives in
//! [`http::HttpUpstream`]; tests substitute scripted implementations.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::Availability;
use crate::Result;

pub use http::HttpUpstream;

#[async_trait]
pub trait GenerationUpstream: Send + Sync {
    /// Fetch the live backend registry. Infallible by contract: any failure
    /// collapses to [`Availability::Unknown`] so the availability filter can
    /// fail open and quota logic still runs.
    async fn list_backends(&self) -> Availability;

    /// One generation call against one backend. HTTP-level failures surface
    /// as [`crate::Error::Remote`]; network/timeout/decoding failures as
    /// [`crate::Error::Transport`]. Success is the parsed response body.
    async fn generate(&self, backend: &str, prompt: &str) -> Result<Value>;
}
