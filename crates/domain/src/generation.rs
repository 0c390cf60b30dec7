//! Page generation results: writer output, reconciled delta, and analysis
//! merged into one record.

use serde::{Deserialize, Serialize};

use crate::reconciliation::ReconciledStateDelta;

/// Writer stage output. Passed through the merge unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterOutput {
    pub narrative: String,
    pub choices: Vec<String>,
    pub raw_response: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    #[default]
    None,
    Nudge,
    Bridge,
    Replan,
}

/// Analyst stage output, as the stage reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalystOutput {
    pub beat_concluded: bool,
    pub beat_resolution: String,
    pub deviation_detected: bool,
    pub deviation_reason: String,
    pub invalidated_beat_ids: Vec<String>,
    pub narrative_summary: String,
    pub pacing_issue_detected: bool,
    pub pacing_issue_reason: String,
    pub recommended_action: RecommendedAction,
}

/// Whether the story has left its planned beats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Deviation {
    #[default]
    NoDeviation,
    #[serde(rename_all = "camelCase")]
    Detected {
        reason: String,
        invalidated_beat_ids: Vec<String>,
        narrative_summary: String,
    },
}

impl Deviation {
    /// A deviation needs every piece: the flag, a reason, a summary, and at
    /// least one invalidated beat. Anything less is no deviation.
    pub fn from_analyst(analyst: &AnalystOutput) -> Self {
        let reason = analyst.deviation_reason.trim();
        let summary = analyst.narrative_summary.trim();
        let beat_ids: Vec<String> = analyst
            .invalidated_beat_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        if !analyst.deviation_detected || reason.is_empty() || summary.is_empty() || beat_ids.is_empty() {
            return Self::NoDeviation;
        }

        Self::Detected {
            reason: reason.to_string(),
            invalidated_beat_ids: beat_ids,
            narrative_summary: summary.to_string(),
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected { .. })
    }
}

/// Analysis as stored on a page; defaults stand in for a missing analyst.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageAnalysis {
    pub beat_concluded: bool,
    pub beat_resolution: String,
    pub pacing_issue_detected: bool,
    pub pacing_issue_reason: String,
    pub recommended_action: RecommendedAction,
    pub deviation: Deviation,
}

impl From<&AnalystOutput> for PageAnalysis {
    fn from(analyst: &AnalystOutput) -> Self {
        Self {
            beat_concluded: analyst.beat_concluded,
            beat_resolution: analyst.beat_resolution.clone(),
            pacing_issue_detected: analyst.pacing_issue_detected,
            pacing_issue_reason: analyst.pacing_issue_reason.clone(),
            recommended_action: analyst.recommended_action,
            deviation: Deviation::from_analyst(analyst),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGenerationResult {
    #[serde(flatten)]
    pub writer: WriterOutput,
    #[serde(flatten)]
    pub state_changes: ReconciledStateDelta,
    #[serde(flatten)]
    pub analysis: PageAnalysis,
}

/// Combine the three stage products. Performs no I/O.
pub fn merge_page_generation_result(
    writer: WriterOutput,
    state_changes: ReconciledStateDelta,
    analyst: Option<&AnalystOutput>,
) -> PageGenerationResult {
    PageGenerationResult {
        writer,
        state_changes,
        analysis: analyst.map(PageAnalysis::from).unwrap_or_default(),
    }
}
