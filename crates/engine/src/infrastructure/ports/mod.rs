//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Generation stages (any OpenAI-compatible endpoint)
//! - Story/page persistence (could swap JSON files -> a database)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{ErrorContext, GenerationError, GenerationErrorCode, RepoError};
pub use external::{
    ChatMessage, GenerationObserver, MessageRole, NoopObserver, StageCompletion, StageKind,
    StagePort, StageRequest,
};
pub use repos::StoryRepo;
pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::MockStagePort;
#[cfg(test)]
pub use repos::MockStoryRepo;
#[cfg(test)]
pub use testing::MockClockPort;
