//! Create story use case.

use std::sync::Arc;

use storyloom_domain::{DomainError, Story};

use crate::infrastructure::ports::{ClockPort, RepoError, StoryRepo};

#[derive(Debug, thiserror::Error)]
pub enum CreateStoryError {
    #[error("Invalid story: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct CreateStory {
    story_repo: Arc<dyn StoryRepo>,
    clock: Arc<dyn ClockPort>,
}

impl CreateStory {
    pub fn new(story_repo: Arc<dyn StoryRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { story_repo, clock }
    }

    pub async fn execute(&self, title: &str) -> Result<Story, CreateStoryError> {
        let story = Story::new(title, self.clock.now())?;
        self.story_repo.save_story(&story).await?;

        tracing::info!(story_id = %story.id(), title = %story.title(), "Created story");
        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockClockPort, MockStoryRepo};
    use chrono::{TimeZone, Utc};

    fn fixed_clock() -> MockClockPort {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || now);
        clock
    }

    #[tokio::test]
    async fn saves_new_story() {
        let mut repo = MockStoryRepo::new();
        repo.expect_save_story()
            .withf(|story| story.title() == "The Ember Road")
            .times(1)
            .returning(|_| Ok(()));

        let use_case = CreateStory::new(Arc::new(repo), Arc::new(fixed_clock()));
        let story = use_case.execute("The Ember Road").await.unwrap();

        assert_eq!(story.created_at(), Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        assert!(story.world_canon().is_empty());
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_saving() {
        let repo = MockStoryRepo::new();

        let use_case = CreateStory::new(Arc::new(repo), Arc::new(fixed_clock()));
        let result = use_case.execute("  ").await;

        assert!(matches!(result, Err(CreateStoryError::Domain(_))));
    }
}
