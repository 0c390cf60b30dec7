//! Persisted entities.

mod page;
mod story;

pub use page::Page;
pub use story::Story;
