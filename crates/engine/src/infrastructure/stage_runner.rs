//! Runs one generation stage: call, decode, validate, retry.

use std::sync::Arc;

use serde_json::Value;

use crate::infrastructure::ports::{
    GenerationError, GenerationErrorCode, GenerationObserver, NoopObserver, StageCompletion,
    StagePort, StageRequest,
};
use crate::infrastructure::retry::{with_retry_observed, RetryConfig};

/// Decoded stage content plus the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub parsed: Value,
    pub raw_text: String,
}

fn no_content() -> GenerationError {
    GenerationError::new(
        GenerationErrorCode::EmptyResponse,
        "Generation stage returned no content",
        true,
    )
}

/// Decode stage message content.
///
/// String content is JSON-decoded and anything else non-null is taken
/// as-is. Blank strings and null are a retryable `EMPTY_RESPONSE`.
pub fn parse_stage_content(content: &Value) -> Result<StageOutput, GenerationError> {
    match content {
        Value::String(text) => {
            if text.trim().is_empty() {
                return Err(no_content().with_raw_content(text.as_str()));
            }
            let parsed = serde_json::from_str(text)
                .map_err(|e| GenerationError::invalid_json(e, text.as_str()))?;
            Ok(StageOutput {
                parsed,
                raw_text: text.clone(),
            })
        }
        Value::Null => Err(no_content()),
        other => Ok(StageOutput {
            parsed: other.clone(),
            raw_text: other.to_string(),
        }),
    }
}

/// Executes stage requests through a [`StagePort`] with retry.
#[derive(Clone)]
pub struct StageRunner {
    port: Arc<dyn StagePort>,
    retry: RetryConfig,
    observer: Arc<dyn GenerationObserver>,
}

impl StageRunner {
    pub fn new(port: Arc<dyn StagePort>, retry: RetryConfig) -> Self {
        Self {
            port,
            retry,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run `request` until `parser` accepts the decoded content.
    ///
    /// One attempt is the call, content decoding and `parser`; a parser
    /// failure keeps its code and retryability and gains the raw content.
    pub async fn run<T, P>(&self, request: &StageRequest, parser: P) -> Result<T, GenerationError>
    where
        P: Fn(&StageOutput) -> Result<T, GenerationError>,
    {
        let stage = request.stage;
        let operation_name = format!("{} stage", stage);
        let parser = &parser;

        self.observer.on_stage_started(stage);

        let result = with_retry_observed(
            &self.retry,
            &operation_name,
            || async move {
                let StageCompletion { content } = self.port.complete(request.clone()).await?;
                let output = parse_stage_content(&content).map_err(|e| e.with_model(&request.model))?;
                parser(&output).map_err(|e| {
                    e.with_model(&request.model)
                        .with_raw_content(output.raw_text.clone())
                })
            },
            |attempt, error| self.observer.on_stage_retry(stage, attempt, error),
        )
        .await;

        match &result {
            Ok(_) => self.observer.on_stage_completed(stage),
            Err(error) => self.observer.on_stage_failed(stage, error),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{ChatMessage, MockStagePort, StageKind};
    use serde_json::json;
    use std::sync::Mutex;

    fn request() -> StageRequest {
        StageRequest {
            stage: StageKind::Writer,
            model: "writer-model".to_string(),
            temperature: 0.8,
            max_tokens: 512,
            messages: vec![ChatMessage::user("go")],
            response_schema: json!({ "type": "json_object" }),
            api_key: "key".to_string(),
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
        }
    }

    fn narrative_parser(output: &StageOutput) -> Result<String, GenerationError> {
        output
            .parsed
            .get("narrative")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GenerationError::validation("missing narrative"))
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl GenerationObserver for RecordingObserver {
        fn on_stage_started(&self, stage: StageKind) {
            self.events.lock().unwrap().push(format!("started:{}", stage));
        }
        fn on_stage_retry(&self, stage: StageKind, attempt: u32, error: &GenerationError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("retry:{}:{}:{}", stage, attempt, error.code));
        }
        fn on_stage_completed(&self, stage: StageKind) {
            self.events.lock().unwrap().push(format!("completed:{}", stage));
        }
        fn on_stage_failed(&self, stage: StageKind, error: &GenerationError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failed:{}:{}", stage, error.code));
        }
    }

    #[test]
    fn string_content_is_json_decoded() {
        let output = parse_stage_content(&json!("{\"narrative\":\"The door creaks.\"}")).unwrap();
        assert_eq!(output.parsed, json!({ "narrative": "The door creaks." }));
        assert_eq!(output.raw_text, "{\"narrative\":\"The door creaks.\"}");
    }

    #[test]
    fn object_content_passes_through() {
        let output = parse_stage_content(&json!({ "narrative": "x" })).unwrap();
        assert_eq!(output.parsed, json!({ "narrative": "x" }));
    }

    #[test]
    fn blank_and_null_content_are_retryable_empty_responses() {
        for content in [json!(""), json!("  \n"), Value::Null] {
            let error = parse_stage_content(&content).unwrap_err();
            assert_eq!(error.code, GenerationErrorCode::EmptyResponse);
            assert!(error.is_retryable());
        }
    }

    #[test]
    fn malformed_string_content_is_retryable_invalid_json() {
        let error = parse_stage_content(&json!("{not json")).unwrap_err();
        assert_eq!(error.code, GenerationErrorCode::InvalidJson);
        assert!(error.is_retryable());
        assert_eq!(error.context.raw_content.as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn returns_parsed_value_on_first_success() {
        let mut port = MockStagePort::new();
        port.expect_complete().times(1).returning(|_| {
            Ok(StageCompletion {
                content: json!("{\"narrative\":\"Rain falls.\"}"),
            })
        });

        let runner = StageRunner::new(Arc::new(port), fast_retry(3));
        let narrative = runner.run(&request(), narrative_parser).await.unwrap();

        assert_eq!(narrative, "Rain falls.");
    }

    #[tokio::test]
    async fn parser_failure_is_retried_with_raw_content_attached() {
        let mut port = MockStagePort::new();
        let mut seq = mockall::Sequence::new();
        port.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StageCompletion { content: json!({ "choices": [] }) }));
        port.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StageCompletion { content: json!({ "narrative": "Second try." }) }));

        let observer = Arc::new(RecordingObserver::default());
        let runner = StageRunner::new(Arc::new(port), fast_retry(3)).with_observer(observer.clone());

        let narrative = runner.run(&request(), narrative_parser).await.unwrap();

        assert_eq!(narrative, "Second try.");
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                "started:writer".to_string(),
                "retry:writer:1:VALIDATION_ERROR".to_string(),
                "completed:writer".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_content_is_retried_before_the_parser_runs() {
        let mut port = MockStagePort::new();
        let mut seq = mockall::Sequence::new();
        port.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StageCompletion { content: json!("") }));
        port.expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StageCompletion { content: json!({ "narrative": "Dawn breaks." }) }));

        let observer = Arc::new(RecordingObserver::default());
        let runner = StageRunner::new(Arc::new(port), fast_retry(3)).with_observer(observer.clone());

        let narrative = runner.run(&request(), narrative_parser).await.unwrap();

        assert_eq!(narrative, "Dawn breaks.");
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec![
                "started:writer".to_string(),
                "retry:writer:1:EMPTY_RESPONSE".to_string(),
                "completed:writer".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn exhausted_parser_failures_keep_code_and_context() {
        let mut port = MockStagePort::new();
        port.expect_complete()
            .times(2)
            .returning(|_| Ok(StageCompletion { content: json!("{\"other\":1}") }));

        let runner = StageRunner::new(Arc::new(port), fast_retry(2));
        let error = runner.run(&request(), narrative_parser).await.unwrap_err();

        assert_eq!(error.code, GenerationErrorCode::ValidationError);
        assert!(error.is_retryable());
        assert_eq!(error.context.raw_content.as_deref(), Some("{\"other\":1}"));
        assert_eq!(error.context.model.as_deref(), Some("writer-model"));
    }

    #[tokio::test]
    async fn non_retryable_transport_result_stops_immediately() {
        let mut port = MockStagePort::new();
        port.expect_complete()
            .times(1)
            .returning(|_| Err(GenerationError::http(401, "writer-model", "{}")));

        let observer = Arc::new(RecordingObserver::default());
        let runner = StageRunner::new(Arc::new(port), fast_retry(5)).with_observer(observer.clone());

        let error = runner.run(&request(), narrative_parser).await.unwrap_err();

        assert_eq!(error.code, GenerationErrorCode::HttpError);
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["started:writer".to_string(), "failed:writer:HTTP_ERROR".to_string()]
        );
    }
}
