//! OpenAI-compatible chat-completions client for generation stages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{
    ChatMessage, GenerationError, StageCompletion, StagePort, StageRequest,
};

/// Default chat-completions endpoint.
pub const DEFAULT_STAGE_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Client for any endpoint speaking the OpenAI chat-completions shape.
#[derive(Clone)]
pub struct OpenAiStageClient {
    client: Client,
    endpoint: String,
}

impl OpenAiStageClient {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Self {
        // Stage calls can be slow; a timeout surfaces as a retryable transport error
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StagePort for OpenAiStageClient {
    async fn complete(&self, request: StageRequest) -> Result<StageCompletion, GenerationError> {
        let model = request.model.clone();
        let body = ChatCompletionRequest::from_stage_request(&request);

        tracing::debug!(stage = %request.stage, model = %model, "Sending stage request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::transport(&model, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::transport(&model, e))?;

        if !status.is_success() {
            return Err(GenerationError::http(status.as_u16(), &model, &text));
        }

        completion_from_body(&text, &model)
    }
}

/// Extract the first choice's message content from a success body.
fn completion_from_body(body: &str, model: &str) -> Result<StageCompletion, GenerationError> {
    if body.trim().is_empty() {
        return Err(GenerationError::empty_response(model));
    }

    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::invalid_json(e, body).with_model(model))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.is_null())
        .ok_or_else(|| GenerationError::empty_response(model))?;

    Ok(StageCompletion { content })
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    response_format: &'a serde_json::Value,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_stage_request(request: &'a StageRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: &request.response_schema,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{GenerationErrorCode, StageKind};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request() -> StageRequest {
        StageRequest {
            stage: StageKind::Writer,
            model: "writer-model".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            messages: vec![ChatMessage::system("Write."), ChatMessage::user("{}")],
            response_schema: serde_json::json!({ "type": "json_object" }),
            api_key: "sk-test".to_string(),
        }
    }

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).to_string()
        });

        (url, handle)
    }

    #[test]
    fn request_body_has_openai_shape() {
        let request = request();
        let body = serde_json::to_value(ChatCompletionRequest::from_stage_request(&request)).unwrap();

        assert_eq!(body["model"], "writer-model");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "{}");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("api_key").is_none());
    }

    #[test]
    fn string_and_object_content_are_both_accepted() {
        let string_body = r#"{"choices":[{"message":{"content":"{\"narrative\":\"x\"}"}}]}"#;
        let object_body = r#"{"choices":[{"message":{"content":{"narrative":"x"}}}]}"#;

        let from_string = completion_from_body(string_body, "m").unwrap();
        let from_object = completion_from_body(object_body, "m").unwrap();

        assert_eq!(from_string.content, serde_json::json!("{\"narrative\":\"x\"}"));
        assert_eq!(from_object.content, serde_json::json!({ "narrative": "x" }));
    }

    #[test]
    fn empty_bodies_and_missing_content_are_retryable() {
        for body in ["", "   ", r#"{"choices":[]}"#, r#"{"choices":[{"message":{"content":null}}]}"#] {
            let error = completion_from_body(body, "m").unwrap_err();
            assert_eq!(error.code, GenerationErrorCode::EmptyResponse, "{body}");
            assert!(error.is_retryable());
        }
    }

    #[test]
    fn malformed_body_is_invalid_json() {
        let error = completion_from_body("<html>oops</html>", "m").unwrap_err();
        assert_eq!(error.code, GenerationErrorCode::InvalidJson);
        assert_eq!(error.context.raw_content.as_deref(), Some("<html>oops</html>"));
    }

    #[tokio::test]
    async fn sends_bearer_auth_and_returns_content() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"{\"ok\":true}"}}]}"#,
        )
        .await;
        let client = OpenAiStageClient::new(&url, 5);

        let completion = client.complete(request()).await.unwrap();
        let received = server.await.unwrap();

        assert_eq!(completion.content, serde_json::json!("{\"ok\":true}"));
        assert!(received.starts_with("POST /v1/chat/completions"));
        assert!(received.to_lowercase().contains("authorization: bearer sk-test"));
        assert!(received.contains("\"model\":\"writer-model\""));
    }

    #[tokio::test]
    async fn rate_limit_is_classified_retryable() {
        let (url, server) = serve_once(
            "429 Too Many Requests",
            r#"{"error":{"message":"slow down"}}"#,
        )
        .await;
        let client = OpenAiStageClient::new(&url, 5);

        let error = client.complete(request()).await.unwrap_err();
        server.await.unwrap();

        assert_eq!(error.code, GenerationErrorCode::HttpError);
        assert!(error.is_retryable());
        assert_eq!(error.context.http_status, Some(429));
        assert_eq!(error.context.model.as_deref(), Some("writer-model"));
        assert_eq!(error.message, "Generation request failed: slow down");
    }

    #[tokio::test]
    async fn bad_request_is_not_retryable() {
        let (url, server) = serve_once("400 Bad Request", r#"{"error":{"message":"bad schema"}}"#).await;
        let client = OpenAiStageClient::new(&url, 5);

        let error = client.complete(request()).await.unwrap_err();
        server.await.unwrap();

        assert!(!error.is_retryable());
        assert_eq!(error.context.http_status, Some(400));
    }
}
