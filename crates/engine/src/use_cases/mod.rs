//! Use cases - User story orchestration.
//!
//! Use cases coordinate the stage runner and repositories around the pure
//! domain functions.

pub mod story;

pub use story::StoryUseCases;
