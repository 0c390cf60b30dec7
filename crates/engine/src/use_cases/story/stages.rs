//! Writer and analyst stage definitions: requests, response schemas, and
//! output validation.

use serde::Serialize;
use serde_json::{json, Value};
use storyloom_domain::state::CharacterCanon;
use storyloom_domain::{AnalystOutput, Page, StateIntents, StateSnapshot, Story, WriterOutput};

use crate::infrastructure::ports::{ChatMessage, GenerationError, StageKind, StageRequest};
use crate::infrastructure::settings::StageSettings;
use crate::infrastructure::stage_runner::StageOutput;

const WRITER_SYSTEM_PROMPT: &str = "You continue an interactive branching story. \
Write the next page as second-person prose, then offer the reader two to four choices. \
Report every change to the story state as stateIntents. Refer to existing threats, \
constraints and threads only by the ids shown in the state. Respond with JSON only.";

const ANALYST_SYSTEM_PROMPT: &str = "You review one page of an interactive story against \
its current state. Report whether the current beat concluded, whether the story deviated \
from its plan, and whether pacing needs attention. Respond with JSON only.";

/// What the writer stage produced, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterStageOutput {
    pub writer: WriterOutput,
    pub intents: StateIntents,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriterContext<'a> {
    story_title: &'a str,
    world_canon: &'a [String],
    character_canon: &'a CharacterCanon,
    state: &'a StateSnapshot,
    previous_narrative: Option<&'a str>,
    choice_taken: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalystContext<'a> {
    story_title: &'a str,
    narrative: &'a str,
    state: &'a StateSnapshot,
}

pub fn writer_request(
    settings: &StageSettings,
    api_key: &str,
    story: &Story,
    parent: Option<&Page>,
    choice_taken: Option<&str>,
    state: &StateSnapshot,
) -> StageRequest {
    let context = WriterContext {
        story_title: story.title(),
        world_canon: story.world_canon(),
        character_canon: story.character_canon(),
        state,
        previous_narrative: parent.map(|page| page.narrative.as_str()),
        choice_taken,
    };

    StageRequest {
        stage: StageKind::Writer,
        model: settings.model.clone(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        messages: vec![
            ChatMessage::system(WRITER_SYSTEM_PROMPT),
            ChatMessage::user(json!(context).to_string()),
        ],
        response_schema: writer_response_schema(),
        api_key: api_key.to_string(),
    }
}

pub fn analyst_request(
    settings: &StageSettings,
    api_key: &str,
    story: &Story,
    narrative: &str,
    state: &StateSnapshot,
) -> StageRequest {
    let context = AnalystContext {
        story_title: story.title(),
        narrative,
        state,
    };

    StageRequest {
        stage: StageKind::Analyst,
        model: settings.model.clone(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        messages: vec![
            ChatMessage::system(ANALYST_SYSTEM_PROMPT),
            ChatMessage::user(json!(context).to_string()),
        ],
        response_schema: analyst_response_schema(),
        api_key: api_key.to_string(),
    }
}

/// Writer output must carry a non-blank narrative; choices must be strings.
/// Missing or malformed state intents fail the attempt so it can be retried.
pub fn parse_writer_output(output: &StageOutput) -> Result<WriterStageOutput, GenerationError> {
    let narrative = output
        .parsed
        .get("narrative")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|narrative| !narrative.is_empty())
        .ok_or_else(|| GenerationError::validation("Writer output is missing narrative"))?;

    let choices = match output.parsed.get("choices") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|choice| choice.trim().to_string())
                    .ok_or_else(|| GenerationError::validation("Writer choices must be strings"))
            })
            .filter(|choice| !matches!(choice, Ok(text) if text.is_empty()))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(GenerationError::validation("Writer choices must be an array")),
    };

    let intents = match output.parsed.get("stateIntents") {
        None | Some(Value::Null) => StateIntents::default(),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            GenerationError::validation(format!("Writer stateIntents are malformed: {}", e))
        })?,
    };

    Ok(WriterStageOutput {
        writer: WriterOutput {
            narrative: narrative.to_string(),
            choices,
            raw_response: output.raw_text.clone(),
        },
        intents,
    })
}

pub fn parse_analyst_output(output: &StageOutput) -> Result<AnalystOutput, GenerationError> {
    serde_json::from_value(output.parsed.clone())
        .map_err(|e| GenerationError::validation(format!("Analyst output is malformed: {}", e)))
}

fn json_schema(name: &str, schema: Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "strict": false,
            "schema": schema,
        }
    })
}

fn text_list_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "add": { "type": "array", "items": { "type": "string" } },
            "remove": { "type": "array", "items": { "type": "string" } }
        }
    })
}

fn character_list_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "characterName": { "type": "string" },
                "states": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["characterName", "states"]
        }
    })
}

fn writer_response_schema() -> Value {
    json_schema(
        "writer_output",
        json!({
            "type": "object",
            "properties": {
                "narrative": { "type": "string" },
                "choices": { "type": "array", "items": { "type": "string" } },
                "stateIntents": {
                    "type": "object",
                    "properties": {
                        "currentLocation": { "type": "string" },
                        "threats": {
                            "type": "object",
                            "properties": {
                                "add": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "text": { "type": "string" },
                                            "threatType": { "type": "string" }
                                        },
                                        "required": ["text", "threatType"]
                                    }
                                },
                                "removeIds": { "type": "array", "items": { "type": "string" } }
                            }
                        },
                        "constraints": {
                            "type": "object",
                            "properties": {
                                "add": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "text": { "type": "string" },
                                            "constraintType": { "type": "string" }
                                        },
                                        "required": ["text", "constraintType"]
                                    }
                                },
                                "removeIds": { "type": "array", "items": { "type": "string" } }
                            }
                        },
                        "threads": {
                            "type": "object",
                            "properties": {
                                "add": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "text": { "type": "string" },
                                            "threadType": { "type": "string" },
                                            "urgency": { "type": "string" }
                                        },
                                        "required": ["text", "threadType", "urgency"]
                                    }
                                },
                                "resolveIds": { "type": "array", "items": { "type": "string" } }
                            }
                        },
                        "inventory": text_list_schema(),
                        "health": text_list_schema(),
                        "accumulatedState": text_list_schema(),
                        "characterState": {
                            "type": "object",
                            "properties": {
                                "add": character_list_schema(),
                                "remove": character_list_schema()
                            }
                        },
                        "canon": {
                            "type": "object",
                            "properties": {
                                "worldFacts": { "type": "array", "items": { "type": "string" } },
                                "characterFacts": character_list_schema()
                            }
                        }
                    }
                }
            },
            "required": ["narrative", "choices"]
        }),
    )
}

fn analyst_response_schema() -> Value {
    json_schema(
        "analyst_output",
        json!({
            "type": "object",
            "properties": {
                "beatConcluded": { "type": "boolean" },
                "beatResolution": { "type": "string" },
                "deviationDetected": { "type": "boolean" },
                "deviationReason": { "type": "string" },
                "invalidatedBeatIds": { "type": "array", "items": { "type": "string" } },
                "narrativeSummary": { "type": "string" },
                "pacingIssueDetected": { "type": "boolean" },
                "pacingIssueReason": { "type": "string" },
                "recommendedAction": {
                    "type": "string",
                    "enum": ["none", "nudge", "bridge", "replan"]
                }
            }
        }),
    )
}
