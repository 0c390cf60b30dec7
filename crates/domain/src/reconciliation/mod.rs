//! Intent reconciliation: raw stage intents in, applicable delta out.

mod intents;
mod reconciler;

pub use intents::{
    CanonIntents, CharacterStateIntents, ConstraintAddIntent, ConstraintIntents, StateIntents,
    TextListIntents, ThreadAddIntent, ThreadIntents, ThreatAddIntent, ThreatIntents,
};
pub use reconciler::{
    normalize_and_validate_remove_ids, reconcile_state_intents, KnownStateIds,
    ReconciledConstraint, ReconciledStateDelta, ReconciledThread, ReconciledThreat,
};
