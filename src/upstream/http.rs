//! Generative Language API client. Key wire details:
//! - API key travels as a `?key=` query parameter, not a header.
//! - Model listing: `GET /v1beta/models`; entries advertise
//!   `supportedGenerationMethods`, and names arrive as `models/<name>`.
//! - Generation: `POST /v1beta/models/<name>:generateContent` with
//!   `{"contents":[{"parts":[{"text": ...}]}]}`.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::GenerationUpstream;
use crate::catalog::Availability;
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpUpstream {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
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
            api_key: api_key.into(),
        })
    }

    /// Ensure the `models/` path prefix the generate endpoint expects.
    fn model_path(backend: &str) -> String {
        if backend.starts_with("models/") {
            backend.to_string()
        } else {
            format!("models/{}", backend)
        }
    }

    /// Keep entries that can serve `generateContent`, normalized to bare
    /// names (`models/gemini-1.5-flash` -> `gemini-1.5-flash`).
    fn live_names_from_listing(listing: &Value) -> Vec<String> {
        listing
            .get("models")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter(|m| {
                        m.get("supportedGenerationMethods")
                            .and_then(Value::as_array)
                            .map(|methods| {
                                methods
                                    .iter()
                                    .any(|v| v.as_str() == Some("generateContent"))
                            })
                            .unwrap_or(false)
                    })
                    .filter_map(|m| m.get("name").and_then(Value::as_str))
                    .map(|name| name.trim_start_matches("models/").to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationUpstream for HttpUpstream {
    async fn list_backends(&self) -> Availability {
        let url = format!("{}/v1beta/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "backend listing fetch failed, failing open");
                return Availability::Unknown;
            }
        };

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(http_status = status, body = body.as_str(), "backend listing rejected, failing open");
            return Availability::Unknown;
        }

        let listing: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "backend listing body unreadable, failing open");
                return Availability::Unknown;
            }
        };

        let names = Self::live_names_from_listing(&listing);
        debug!(live_count = names.len(), "fetched backend listing");
        Availability::from_names(names)
    }

    async fn generate(&self, backend: &str, prompt: &str) -> Result<Value> {
        let url = format!(
            "{}/v1beta/{}:generateContent",
            self.base_url,
            Self::model_path(backend)
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "contents": [{
                    "parts": [{ "text": prompt }]
                }]
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::remote_from_status(
                status,
                format!("API Error {}: {}", status, body),
            ));
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_path_prefixes_bare_names() {
        assert_eq!(HttpUpstream::model_path("gemini-1.5-flash"), "models/gemini-1.5-flash");
        assert_eq!(
            HttpUpstream::model_path("models/gemini-1.5-flash"),
            "models/gemini-1.5-flash"
        );
    }

    #[test]
    fn listing_filters_on_generate_capability() {
        let listing = serde_json::json!({
            "models": [
                {
                    "name": "models/gemini-2.0-flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {
                    "name": "models/embedding-001",
                    "supportedGenerationMethods": ["embedContent"]
                },
                {
                    "name": "models/no-methods"
                }
            ]
        });
        let names = HttpUpstream::live_names_from_listing(&listing);
        assert_eq!(names, vec!["gemini-2.0-flash"]);
    }

    #[test]
    fn listing_without_models_key_is_empty() {
        let names = HttpUpstream::live_names_from_listing(&serde_json::json!({}));
        assert!(names.is_empty());
        assert_eq!(Availability::from_names(names), Availability::Unknown);
    }
}
