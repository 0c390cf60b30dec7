//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    persistence::FileStoryRepo,
    ports::{ClockPort, GenerationObserver, StagePort, StoryRepo},
    settings::EngineSettings,
    stage_client::OpenAiStageClient,
    stage_runner::StageRunner,
};
use crate::use_cases::story::{CreateStory, GeneratePage, PageStages, StoryUseCases};

/// Main application state.
pub struct App {
    pub story_repo: Arc<dyn StoryRepo>,
    pub use_cases: StoryUseCases,
}

impl App {
    /// Wire the file-backed repository and the HTTP stage client from
    /// settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        let stage_port: Arc<dyn StagePort> = Arc::new(OpenAiStageClient::new(
            &settings.endpoint,
            settings.timeout_secs,
        ));
        let story_repo: Arc<dyn StoryRepo> = Arc::new(FileStoryRepo::new(&settings.stories_dir));
        Self::new(story_repo, stage_port, Arc::new(SystemClock::new()), settings, None)
    }

    pub fn new(
        story_repo: Arc<dyn StoryRepo>,
        stage_port: Arc<dyn StagePort>,
        clock: Arc<dyn ClockPort>,
        settings: &EngineSettings,
        observer: Option<Arc<dyn GenerationObserver>>,
    ) -> Self {
        let mut runner = StageRunner::new(stage_port, settings.retry.clone());
        if let Some(observer) = observer {
            runner = runner.with_observer(observer);
        }

        let stages = PageStages {
            api_key: settings.api_key.clone(),
            writer: settings.writer.clone(),
            analyst: Some(settings.analyst.clone()),
        };

        let create_story = Arc::new(CreateStory::new(story_repo.clone(), clock.clone()));
        let generate_page = Arc::new(GeneratePage::new(story_repo.clone(), runner, clock, stages));

        Self {
            story_repo,
            use_cases: StoryUseCases::new(create_story, generate_page),
        }
    }
}
