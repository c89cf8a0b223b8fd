use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "request.model", "LEDGER_URL")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., upstream response body excerpt)
    pub details: Option<String>,
    /// Source of the error (e.g., "selector", "rest_ledger")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the dispatch gateway.
/// Aggregates low-level failures into the categories the retry policy acts on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote error: HTTP {status} ({class}): {message}")]
    Remote {
        status: u16,
        class: String,
        message: String,
        retryable: bool,
        fallbackable: bool,
    },

    #[error("Empty result: {message}")]
    EmptyResult { message: String },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

/// True for the HTTP statuses the upstream uses to signal throttling or
/// capacity exhaustion. Only these are worth trying on another backend.
pub fn is_overload_status(status: u16) -> bool {
    matches!(status, 429 | 503)
}

/// Map an upstream HTTP status to an error class string.
pub fn class_for_status(status: u16) -> &'static str {
    match status {
        429 => "rate_limited",
        503 => "overloaded",
        400 => "invalid_request",
        401 => "authentication",
        403 => "permission_denied",
        404 => "not_found",
        s if (500..=599).contains(&s) => "server_error",
        _ => "http_error",
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Build a remote error from an upstream HTTP status and response body.
    pub fn remote_from_status(status: u16, body: impl Into<String>) -> Self {
        let overload = is_overload_status(status);
        Error::Remote {
            status,
            class: class_for_status(status).to_string(),
            message: body.into(),
            retryable: overload,
            fallbackable: overload,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. }
            | Error::Configuration { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_statuses() {
        assert!(is_overload_status(429));
        assert!(is_overload_status(503));
        assert!(!is_overload_status(400));
        assert!(!is_overload_status(500));
        assert!(!is_overload_status(404));
    }

    #[test]
    fn status_classes() {
        assert_eq!(class_for_status(429), "rate_limited");
        assert_eq!(class_for_status(503), "overloaded");
        assert_eq!(class_for_status(500), "server_error");
        assert_eq!(class_for_status(401), "authentication");
        assert_eq!(class_for_status(418), "http_error");
    }

    #[test]
    fn remote_from_status_flags() {
        match Error::remote_from_status(429, "slow down") {
            Error::Remote {
                retryable,
                fallbackable,
                class,
                ..
            } => {
                assert!(retryable);
                assert!(fallbackable);
                assert_eq!(class, "rate_limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match Error::remote_from_status(400, "bad prompt") {
            Error::Remote {
                retryable,
                fallbackable,
                ..
            } => {
                assert!(!retryable);
                assert!(!fallbackable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn context_formatting() {
        let err = Error::validation_with_context(
            "model is required",
            ErrorContext::new()
                .with_field_path("request.model")
                .with_source("service"),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("model is required"));
        assert!(rendered.contains("field: request.model"));
        assert!(rendered.contains("source: service"));
    }
}
