//! File-backed story and page storage.
//!
//! Layout under the root directory:
//! - `<story_id>/story.json`
//! - `<story_id>/pages/<page_id>.json`
//!
//! Every write for a story runs under that story's lock.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use storyloom_domain::{Page, PageId, ReconciledStateDelta, Story, StoryId};

use super::json_store::JsonFileStore;
use crate::infrastructure::ports::{RepoError, StoryRepo};

pub struct FileStoryRepo {
    root: PathBuf,
    store: JsonFileStore,
}

impl FileStoryRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store: JsonFileStore::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn story_path(&self, id: StoryId) -> PathBuf {
        self.root.join(id.to_string()).join("story.json")
    }

    fn page_path(&self, story_id: StoryId, page_id: PageId) -> PathBuf {
        self.root
            .join(story_id.to_string())
            .join("pages")
            .join(format!("{}.json", page_id))
    }
}

#[async_trait]
impl StoryRepo for FileStoryRepo {
    async fn get_story(&self, id: StoryId) -> Result<Option<Story>, RepoError> {
        self.store.read(&self.story_path(id)).await
    }

    async fn save_story(&self, story: &Story) -> Result<(), RepoError> {
        let key = story.id().to_string();
        self.store.write(&key, &self.story_path(story.id()), story).await
    }

    async fn get_page(&self, story_id: StoryId, page_id: PageId) -> Result<Option<Page>, RepoError> {
        self.store.read(&self.page_path(story_id, page_id)).await
    }

    async fn commit_page(&self, page: &Page, delta: &ReconciledStateDelta) -> Result<Story, RepoError> {
        let key = page.story_id.to_string();
        let story_path = self.story_path(page.story_id);
        let page_path = self.page_path(page.story_id, page.id);

        self.store
            .run_with_lock(&key, || async {
                // Read inside the lock so concurrent commits never drop canon
                let story: Story = self
                    .store
                    .read(&story_path)
                    .await?
                    .ok_or_else(|| RepoError::not_found("Story", page.story_id))?;

                self.store.write_within_lock(&page_path, page).await?;

                let story = if delta.has_canon_additions() {
                    let story = story.with_canon_from(delta);
                    self.store.write_within_lock(&story_path, &story).await?;
                    story
                } else {
                    story
                };

                tracing::debug!(
                    story_id = %page.story_id,
                    page_id = %page.id,
                    "Committed page"
                );
                Ok(story)
            })
            .await
    }
}
