//! Error types for port operations.

use std::fmt;

use serde::Serialize;

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Filesystem operation failed - includes operation name for tracing.
    #[error("I/O error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create an Io error with operation context.
    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Classification of a failed generation stage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationErrorCode {
    HttpError,
    TransportError,
    EmptyResponse,
    InvalidJson,
    ValidationError,
    UnknownError,
}

impl GenerationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpError => "HTTP_ERROR",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::InvalidJson => "INVALID_JSON",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for GenerationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was known about the call when it failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    pub http_status: Option<u16>,
    pub model: Option<String>,
    pub raw_error_body: Option<String>,
    pub parsed_error: Option<serde_json::Value>,
    /// Stage content that failed to parse or validate.
    pub raw_content: Option<String>,
}

/// A classified stage failure. `retryable` drives the retry policy.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct GenerationError {
    pub message: String,
    pub code: GenerationErrorCode,
    pub retryable: bool,
    pub context: ErrorContext,
}

impl GenerationError {
    pub fn new(code: GenerationErrorCode, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            code,
            retryable,
            context: ErrorContext::default(),
        }
    }

    /// Non-2xx response. Retryable iff 429 or 5xx.
    pub fn http(status: u16, model: &str, raw_body: &str) -> Self {
        let parsed_error = serde_json::from_str::<serde_json::Value>(raw_body).ok();
        let detail = parsed_error
            .as_ref()
            .and_then(|body| body.pointer("/error/message"))
            .and_then(|message| message.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Self {
            message: format!("Generation request failed: {}", detail),
            code: GenerationErrorCode::HttpError,
            retryable: status == 429 || status >= 500,
            context: ErrorContext {
                http_status: Some(status),
                model: Some(model.to_string()),
                raw_error_body: Some(raw_body.to_string()),
                parsed_error,
                raw_content: None,
            },
        }
    }

    /// Connection, timeout, or body-read failure.
    pub fn transport(model: &str, error: impl fmt::Display) -> Self {
        Self::new(GenerationErrorCode::TransportError, error.to_string(), true).with_model(model)
    }

    pub fn empty_response(model: &str) -> Self {
        Self::new(GenerationErrorCode::EmptyResponse, "Generation stage returned no content", true)
            .with_model(model)
    }

    pub fn invalid_json(detail: impl fmt::Display, raw_content: impl Into<String>) -> Self {
        Self::new(
            GenerationErrorCode::InvalidJson,
            format!("Stage content is not valid JSON: {}", detail),
            true,
        )
        .with_raw_content(raw_content)
    }

    /// Stage output parsed but failed a type-specific check.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorCode::ValidationError, message, true)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(GenerationErrorCode::UnknownError, message, false)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.context.model = Some(model.to_string());
        self
    }

    pub fn with_raw_content(mut self, raw_content: impl Into<String>) -> Self {
        self.context.raw_content = Some(raw_content.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
