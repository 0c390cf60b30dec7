//! Repository port traits.

use async_trait::async_trait;
use storyloom_domain::{Page, PageId, ReconciledStateDelta, Story, StoryId};

use super::error::RepoError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryRepo: Send + Sync {
    async fn get_story(&self, id: StoryId) -> Result<Option<Story>, RepoError>;
    async fn save_story(&self, story: &Story) -> Result<(), RepoError>;

    async fn get_page(&self, story_id: StoryId, page_id: PageId) -> Result<Option<Page>, RepoError>;

    /// Persist a page and fold the delta's canon into its story, both inside
    /// the story's single-writer section. Returns the updated story.
    async fn commit_page(&self, page: &Page, delta: &ReconciledStateDelta) -> Result<Story, RepoError>;
}
