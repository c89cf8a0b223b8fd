//! PostgREST-backed ledger.
//!
//! The durable, globally shared attempt log lives in a `request_logs`-style
//! table behind a PostgREST endpoint. Exact counts use `Prefer: count=exact`
//! with a zero-length `Range` so only the `Content-Range` total crosses the
//! wire; inserts use `Prefer: return=minimal`.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use super::{AttemptStatus, UsageLedger};
use crate::{Error, ErrorContext, Result};

const DEFAULT_TABLE: &str = "ai_request_logs";

pub struct RestLedger {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    table: String,
}

impl RestLedger {
    /// Build a ledger against a PostgREST base URL (no trailing slash) using
    /// a service-role key for both the `apikey` and bearer headers.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self> {
        let timeout_secs = env::var("MODELGATE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            table: DEFAULT_TABLE.to_string(),
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

/// Extract the total from a `Content-Range` header value such as `0-0/57`
/// or `*/0`.
pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl UsageLedger for RestLedger {
    async fn count_since(&self, backend: &str, since: DateTime<Utc>) -> Result<u64> {
        let since_iso = since.to_rfc3339_opts(SecondsFormat::Millis, true);
        let resp = self
            .client
            .get(self.table_url())
            .query(&[
                ("select", "id"),
                ("model", &format!("eq.{}", backend)),
                ("created_at", &format!("gte.{}", since_iso)),
            ])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::remote_from_status(status, body));
        }

        let total = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        match total {
            Some(n) => Ok(n),
            None => {
                // Degraded read: a ledger that cannot report a count must not
                // take the whole dispatch down. The selector treats this as
                // zero usage (fail open).
                warn!(backend, "ledger count response missing content-range total");
                Ok(0)
            }
        }
    }

    async fn record(
        &self,
        backend: &str,
        status: AttemptStatus,
        detail: Option<&str>,
    ) -> Result<()> {
        let resp = self
            .client
            .post(self.table_url())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({
                "model": backend,
                "status": status.as_str(),
                "details": detail,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status_code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::runtime_with_context(
                format!("ledger insert failed: HTTP {}: {}", status_code, body),
                ErrorContext::new().with_source("rest_ledger"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("0-0/57"), Some(57));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/1500"), Some(1500));
        assert_eq!(parse_content_range_total("garbage"), None);
        assert_eq!(parse_content_range_total("0-0/*"), None);
        assert_eq!(parse_content_range_total(""), None);
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let ledger = RestLedger::new("https://ledger.example.com/", "key").unwrap();
        assert_eq!(
            ledger.table_url(),
            "https://ledger.example.com/rest/v1/ai_request_logs"
        );
    }

    #[test]
    fn table_override() {
        let ledger = RestLedger::new("https://ledger.example.com", "key")
            .unwrap()
            .with_table("attempt_log");
        assert_eq!(
            ledger.table_url(),
            "https://ledger.example.com/rest/v1/attempt_log"
        );
    }
}
