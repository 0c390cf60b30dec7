//! Story state and the pure functions that advance it.

mod active_state;
mod characters;
mod ledger;
mod snapshot;

pub use active_state::{apply_active_state_changes, ActiveState, ActiveStateChanges};
pub use characters::{
    apply_character_state_changes, merge_character_canon, merge_world_canon,
    normalize_character_state_adds, normalize_character_state_removals, CharacterCanon,
    CharacterCanonEntry, CharacterStateIntent, CharacterStateMap, ReconciledCharacterStateAdd,
};
pub use ledger::{
    apply_accumulated_state_changes, apply_health_changes, apply_inventory_changes,
    apply_ledger_changes, LedgerChanges, LedgerKind,
};
pub use snapshot::StateSnapshot;
