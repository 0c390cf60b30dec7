//! External service port traits (generation stages, progress observers).

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::GenerationError;

// =============================================================================
// Stage Types
// =============================================================================

/// One independently invoked unit of content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Writer,
    Analyst,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Writer => "writer",
            Self::Analyst => "analyst",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request envelope for one stage call.
#[derive(Clone)]
pub struct StageRequest {
    pub stage: StageKind,
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    /// Sent verbatim as `response_format`
    pub response_schema: serde_json::Value,
    pub api_key: String,
}

impl fmt::Debug for StageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRequest")
            .field("stage", &self.stage)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("messages", &self.messages.len())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Message content of a successful call: either a JSON string or an
/// already-decoded JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCompletion {
    pub content: serde_json::Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StagePort: Send + Sync {
    /// Issue exactly one request. Retries belong to the caller.
    async fn complete(&self, request: StageRequest) -> Result<StageCompletion, GenerationError>;
}

// =============================================================================
// Progress Observer
// =============================================================================

/// Watches stage execution. Observers cannot influence the pipeline.
pub trait GenerationObserver: Send + Sync {
    fn on_stage_started(&self, _stage: StageKind) {}
    fn on_stage_retry(&self, _stage: StageKind, _attempt: u32, _error: &GenerationError) {}
    fn on_stage_completed(&self, _stage: StageKind) {}
    fn on_stage_failed(&self, _stage: StageKind, _error: &GenerationError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}
