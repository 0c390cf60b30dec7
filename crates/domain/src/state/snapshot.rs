//! The complete accumulated state stored on every page.

use serde::{Deserialize, Serialize};

use super::active_state::{apply_active_state_changes, ActiveState};
use super::characters::{apply_character_state_changes, CharacterStateMap};
use super::ledger::{apply_accumulated_state_changes, apply_health_changes, apply_inventory_changes, LedgerChanges};
use crate::reconciliation::ReconciledStateDelta;
use crate::value_objects::Diagnostics;

/// Immutable once attached to a page. Children derive a new snapshot rather
/// than referencing the parent's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateSnapshot {
    pub active: ActiveState,
    pub inventory: Vec<String>,
    pub health: Vec<String>,
    pub accumulated: Vec<String>,
    pub character_state: CharacterStateMap,
}

impl StateSnapshot {
    /// Fold a reconciled delta into the next snapshot.
    ///
    /// Applier warnings (missed removals, malformed entries) are recorded in
    /// `diagnostics`; they never stop the fold.
    pub fn apply_delta(&self, delta: &ReconciledStateDelta, diagnostics: &mut Diagnostics) -> Self {
        let active_changes = delta.to_active_state_changes(&self.active);

        Self {
            active: apply_active_state_changes(&self.active, &active_changes, diagnostics),
            inventory: apply_inventory_changes(
                &self.inventory,
                &LedgerChanges::new(delta.inventory_added.clone(), delta.inventory_removed.clone()),
                diagnostics,
            ),
            health: apply_health_changes(
                &self.health,
                &LedgerChanges::new(delta.health_added.clone(), delta.health_removed.clone()),
                diagnostics,
            ),
            accumulated: apply_accumulated_state_changes(
                &self.accumulated,
                &LedgerChanges::new(
                    delta.accumulated_state_added.clone(),
                    delta.accumulated_state_removed.clone(),
                ),
                diagnostics,
            ),
            character_state: apply_character_state_changes(
                &self.character_state,
                &delta.character_state_added,
                &delta.character_state_removed,
                diagnostics,
            ),
        }
    }
}
