//! Environment-driven configuration.
//!
//! Secrets are read at startup but validated per request: a missing key
//! fails the requests that need it without taking the process down.

use std::env;
use std::net::SocketAddr;

use url::Url;

use crate::{Error, ErrorContext, Result};

const DEFAULT_BIND: &str = "0.0.0.0:8787";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key for the upstream generation API.
    pub api_key: Option<String>,
    /// Base URL of the PostgREST ledger store.
    pub ledger_url: Option<String>,
    /// Service-role key for the ledger store.
    pub ledger_service_key: Option<String>,
    /// Upstream base URL (override for tests and proxies).
    pub upstream_url: String,
    /// Listen address for the HTTP service.
    pub bind: SocketAddr,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let ledger_url = env::var("LEDGER_URL").ok().filter(|s| !s.is_empty());
        if let Some(ref raw) = ledger_url {
            Url::parse(raw).map_err(|e| {
                Error::configuration_with_context(
                    format!("LEDGER_URL is not a valid URL: {}", e),
                    ErrorContext::new().with_field_path("LEDGER_URL"),
                )
            })?;
        }

        let upstream_url = env::var("MODELGATE_UPSTREAM_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| crate::upstream::http::DEFAULT_BASE_URL.to_string());

        let bind = env::var("MODELGATE_BIND")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .map_err(|e| {
                Error::configuration_with_context(
                    format!("MODELGATE_BIND is not a valid socket address: {}", e),
                    ErrorContext::new().with_field_path("MODELGATE_BIND"),
                )
            })?;

        Ok(Self {
            api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
            ledger_url,
            ledger_service_key: env::var("LEDGER_SERVICE_KEY").ok().filter(|s| !s.is_empty()),
            upstream_url,
            bind,
        })
    }

    /// The secrets a dispatch cycle needs, or a per-request configuration
    /// error naming what is missing.
    pub fn require_secrets(&self) -> Result<(&str, &str, &str)> {
        match (&self.api_key, &self.ledger_url, &self.ledger_service_key) {
            (Some(key), Some(url), Some(service_key)) => Ok((key, url, service_key)),
            _ => Err(Error::configuration_with_context(
                "server configuration error: missing secrets",
                ErrorContext::new()
                    .with_details("GEMINI_API_KEY, LEDGER_URL and LEDGER_SERVICE_KEY are required")
                    .with_source("config"),
            )),
        }
    }
}
