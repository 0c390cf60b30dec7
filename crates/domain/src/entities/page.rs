//! A generated page: narrative, choices, and its own full state snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::{PageAnalysis, PageGenerationResult};
use crate::ids::{PageId, StoryId};
use crate::reconciliation::ReconciledStateDelta;
use crate::state::StateSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub story_id: StoryId,
    pub parent_page_id: Option<PageId>,
    pub choice_taken: Option<String>,
    pub narrative: String,
    pub choices: Vec<String>,
    pub snapshot: StateSnapshot,
    pub state_changes: ReconciledStateDelta,
    pub analysis: PageAnalysis,
    pub created_at: DateTime<Utc>,
}

impl Page {
    /// Build a page from a merged generation result and the snapshot derived
    /// for it. The raw writer response is not kept.
    pub fn from_result(
        story_id: StoryId,
        parent_page_id: Option<PageId>,
        choice_taken: Option<String>,
        result: PageGenerationResult,
        snapshot: StateSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PageId::new(),
            story_id,
            parent_page_id,
            choice_taken,
            narrative: result.writer.narrative,
            choices: result.writer.choices,
            snapshot,
            state_changes: result.state_changes,
            analysis: result.analysis,
            created_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_page_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{merge_page_generation_result, WriterOutput};

    #[test]
    fn page_takes_writer_output_and_snapshot() {
        let writer = WriterOutput {
            narrative: "Rain on the tin roof.".to_string(),
            choices: vec!["Wait".to_string()],
            raw_response: "{\"narrative\":\"...\"}".to_string(),
        };
        let result = merge_page_generation_result(writer, ReconciledStateDelta::default(), None);
        let snapshot = StateSnapshot {
            inventory: vec!["Umbrella".to_string()],
            ..Default::default()
        };

        let page = Page::from_result(StoryId::new(), None, None, result, snapshot.clone(), Utc::now());

        assert!(page.is_root());
        assert_eq!(page.narrative, "Rain on the tin roof.");
        assert_eq!(page.choices, vec!["Wait"]);
        assert_eq!(page.snapshot, snapshot);
    }
}
