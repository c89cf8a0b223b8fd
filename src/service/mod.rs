//! HTTP edge service.
//!
//! Thin glue around the dispatcher: request validation, CORS, and the
//! `{error}` JSON contract. Validation failures reject before any ledger or
//! upstream traffic. Every error — validation, configuration, upstream,
//! empty result — maps to HTTP 400 with `{"error": "..."}`; preflight
//! requests are answered permissively with no body processing.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::catalog::DEFAULT_CATALOG;
use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::ledger::RestLedger;
use crate::prompt::build_prompt;
use crate::structured::{candidate_text, ProductCard};
use crate::upstream::HttpUpstream;
use crate::{Error, ErrorContext, Result};

#[derive(Clone)]
pub struct AppState {
    dispatcher: Option<Arc<Dispatcher>>,
}

impl AppState {
    /// Wire the default catalog to the REST ledger and HTTP upstream from
    /// config. Missing secrets leave the dispatcher unset: the service stays
    /// up and requests fail with a configuration error.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let dispatcher = match config.require_secrets() {
            Ok((api_key, ledger_url, ledger_key)) => {
                let ledger = Arc::new(RestLedger::new(ledger_url, ledger_key)?);
                let upstream = Arc::new(HttpUpstream::new(&config.upstream_url, api_key)?);
                Some(Arc::new(Dispatcher::new(
                    DEFAULT_CATALOG.clone(),
                    ledger,
                    upstream,
                )))
            }
            Err(e) => {
                warn!(error = %e, "secrets missing, requests will be rejected");
                None
            }
        };
        Ok(Self { dispatcher })
    }

    /// Inject a prebuilt dispatcher (tests, embedded use).
    pub fn with_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher: Some(dispatcher),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
}

/// Uniform error body. Everything surfaces as HTTP 400 `{"error": "..."}`.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "request failed");
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/autocomplete-product", post(autocomplete_product))
        .layer(cors)
        .with_state(state)
}

async fn autocomplete_product(
    State(state): State<AppState>,
    body: std::result::Result<Json<AutocompleteRequest>, JsonRejection>,
) -> std::result::Result<Json<ProductCard>, ApiError> {
    let Json(request) = body.map_err(|e| {
        Error::validation_with_context(
            format!("invalid request body: {}", e),
            ErrorContext::new().with_source("service"),
        )
    })?;

    let model = match request.model.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m,
        _ => {
            return Err(Error::validation_with_context(
                "Model is required",
                ErrorContext::new()
                    .with_field_path("request.model")
                    .with_source("service"),
            )
            .into())
        }
    };
    let brand = request.brand.as_deref();
    info!(brand = brand.unwrap_or("-"), model, "autocomplete request received");

    let dispatcher = state.dispatcher.as_ref().ok_or_else(|| {
        Error::configuration_with_context(
            "server configuration error: missing secrets",
            ErrorContext::new().with_source("service"),
        )
    })?;

    let prompt = build_prompt(brand, model);
    let payload = dispatcher.dispatch(&prompt).await?;
    let raw = candidate_text(&payload)?;

    Ok(Json(ProductCard::from_model_text(&raw, brand, model)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn bare_state() -> AppState {
        AppState { dispatcher: None }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_model_is_rejected_before_config_check() {
        let response = router(bare_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/autocomplete-product")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"brand":"Acme"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Model is required"));
    }

    #[tokio::test]
    async fn blank_model_is_rejected() {
        let response = router(bare_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/autocomplete-product")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"model":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_gets_error_shape() {
        let response = router(bare_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/autocomplete-product")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn missing_secrets_fail_per_request() {
        let response = router(bare_state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/autocomplete-product")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"model":"Z1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("missing secrets"));
    }

    #[tokio::test]
    async fn preflight_gets_permissive_cors_headers() {
        let response = router(bare_state())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/autocomplete-product")
                    .header("origin", "https://app.example.com")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type, apikey")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
