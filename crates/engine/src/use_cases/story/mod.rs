//! Story use cases - creating stories and generating their pages.

pub mod create_story;
pub mod generate_page;
pub mod stages;

pub use create_story::{CreateStory, CreateStoryError};
pub use generate_page::{
    GeneratePage, GeneratePageError, GeneratePageInput, GeneratedPage, PageStages,
};

use std::sync::Arc;

/// Container for story use cases.
pub struct StoryUseCases {
    pub create_story: Arc<CreateStory>,
    pub generate_page: Arc<GeneratePage>,
}

impl StoryUseCases {
    pub fn new(create_story: Arc<CreateStory>, generate_page: Arc<GeneratePage>) -> Self {
        Self {
            create_story,
            generate_page,
        }
    }
}
