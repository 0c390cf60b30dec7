//! Generate page use case - the full writer → reconcile → analyst → persist
//! pipeline for one page.

use std::sync::Arc;

use storyloom_domain::{
    merge_page_generation_result, reconcile_state_intents, AnalystOutput, Diagnostics,
    KnownStateIds, Page, PageId, StateReconciliationDiagnostic, StateSnapshot, Story, StoryId,
};

use super::stages::{self, WriterStageOutput};
use crate::infrastructure::ports::{ClockPort, GenerationError, RepoError, StoryRepo};
use crate::infrastructure::settings::StageSettings;
use crate::infrastructure::stage_runner::StageRunner;

/// Models and credentials for the page stages. Without an analyst, pages
/// carry default analysis.
#[derive(Debug, Clone)]
pub struct PageStages {
    pub api_key: String,
    pub writer: StageSettings,
    pub analyst: Option<StageSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratePageInput {
    pub story_id: StoryId,
    /// `None` starts the story.
    pub parent_page_id: Option<PageId>,
    pub choice_taken: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    pub page: Page,
    /// The story after this page's canon was merged.
    pub story: Story,
    /// Problems found while applying the delta to the parent's state.
    pub warnings: Vec<StateReconciliationDiagnostic>,
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratePageError {
    #[error("Story not found: {0}")]
    StoryNotFound(StoryId),
    #[error("Page not found: {0}")]
    PageNotFound(PageId),
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct GeneratePage {
    story_repo: Arc<dyn StoryRepo>,
    runner: StageRunner,
    clock: Arc<dyn ClockPort>,
    stages: PageStages,
}

impl GeneratePage {
    pub fn new(
        story_repo: Arc<dyn StoryRepo>,
        runner: StageRunner,
        clock: Arc<dyn ClockPort>,
        stages: PageStages,
    ) -> Self {
        Self {
            story_repo,
            runner,
            clock,
            stages,
        }
    }

    pub async fn execute(&self, input: GeneratePageInput) -> Result<GeneratedPage, GeneratePageError> {
        let story = self
            .story_repo
            .get_story(input.story_id)
            .await?
            .ok_or(GeneratePageError::StoryNotFound(input.story_id))?;

        let parent = match input.parent_page_id {
            Some(page_id) => Some(
                self.story_repo
                    .get_page(input.story_id, page_id)
                    .await?
                    .ok_or(GeneratePageError::PageNotFound(page_id))?,
            ),
            None => None,
        };
        let state = parent
            .as_ref()
            .map(|page| page.snapshot.clone())
            .unwrap_or_default();

        let writer_request = stages::writer_request(
            &self.stages.writer,
            &self.stages.api_key,
            &story,
            parent.as_ref(),
            input.choice_taken.as_deref(),
            &state,
        );
        let WriterStageOutput { writer, intents } = self
            .runner
            .run(&writer_request, stages::parse_writer_output)
            .await?;

        let known = KnownStateIds::from_active_state(&state.active);
        let delta = reconcile_state_intents(&intents, &known);
        for diagnostic in &delta.diagnostics {
            tracing::warn!(
                story_id = %story.id(),
                code = %diagnostic.code,
                field = %diagnostic.field,
                message = %diagnostic.message,
                "Rejected state intent"
            );
        }

        let mut warnings = Diagnostics::new();
        let next_state = state.apply_delta(&delta, &mut warnings);
        for warning in warnings.iter() {
            tracing::warn!(
                story_id = %story.id(),
                code = %warning.code,
                field = %warning.field,
                message = %warning.message,
                "State change could not be applied cleanly"
            );
        }

        let analysis = self.analyze(&story, &writer.narrative, &next_state).await;

        let result = merge_page_generation_result(writer, delta, analysis.as_ref());
        let page = Page::from_result(
            story.id(),
            input.parent_page_id,
            input.choice_taken,
            result,
            next_state,
            self.clock.now(),
        );

        let story = self.story_repo.commit_page(&page, &page.state_changes).await?;

        tracing::info!(
            story_id = %story.id(),
            page_id = %page.id,
            choices = page.choices.len(),
            warnings = warnings.len(),
            "Generated page"
        );

        Ok(GeneratedPage {
            page,
            story,
            warnings: warnings.into_vec(),
        })
    }

    /// Analyst failures never fail the page; they fall back to defaults.
    async fn analyze(
        &self,
        story: &Story,
        narrative: &str,
        state: &StateSnapshot,
    ) -> Option<AnalystOutput> {
        let settings = self.stages.analyst.as_ref()?;
        let request = stages::analyst_request(settings, &self.stages.api_key, story, narrative, state);

        match self.runner.run(&request, stages::parse_analyst_output).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(
                    story_id = %story.id(),
                    error = %e,
                    "Analyst stage failed, using default analysis"
                );
                None
            }
        }
    }
}
