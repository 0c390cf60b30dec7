//! Storyloom domain: story state, intent reconciliation, and page results.
//!
//! Everything in this crate is synchronous and free of I/O. Functions that
//! can find problems in generated content take a [`Diagnostics`] collector
//! instead of logging or failing.

pub mod entities;
pub mod error;
pub mod generation;
pub mod ids;
pub mod reconciliation;
pub mod state;
pub mod value_objects;

pub use entities::{Page, Story};
pub use error::DomainError;
pub use generation::{
    merge_page_generation_result, AnalystOutput, Deviation, PageAnalysis, PageGenerationResult,
    RecommendedAction, WriterOutput,
};
pub use ids::{PageId, StoryId};
pub use reconciliation::{
    normalize_and_validate_remove_ids, reconcile_state_intents, KnownStateIds,
    ReconciledStateDelta, StateIntents,
};
pub use state::{ActiveState, ActiveStateChanges, StateSnapshot};
pub use value_objects::{
    DiagnosticCode, Diagnostics, EntryCategory, StateReconciliationDiagnostic, TaggedStateEntry,
};
