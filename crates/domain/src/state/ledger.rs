//! Ordered free-text lists: inventory, health, and accumulated story state.
//!
//! All three share one algorithm. Removals run first and take out the first
//! case-insensitive match; additions are trimmed and appended without
//! deduplication, so repeated items accumulate.

use serde::{Deserialize, Serialize};

use crate::value_objects::{intent_comparison_key, DiagnosticCode, Diagnostics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Inventory,
    Health,
    AccumulatedState,
}

impl LedgerKind {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Health => "health",
            Self::AccumulatedState => "accumulatedState",
        }
    }

    /// Inventory misses are silent; the other ledgers report them.
    fn warns_on_unmatched_removal(&self) -> bool {
        !matches!(self, Self::Inventory)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl LedgerChanges {
    pub fn new(added: Vec<String>, removed: Vec<String>) -> Self {
        Self { added, removed }
    }
}

pub fn apply_ledger_changes(
    kind: LedgerKind,
    current: &[String],
    changes: &LedgerChanges,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let mut result = current.to_vec();

    for removal in &changes.removed {
        let key = intent_comparison_key(removal);
        if key.is_empty() {
            continue;
        }
        match result.iter().position(|entry| intent_comparison_key(entry) == key) {
            Some(index) => {
                result.remove(index);
            }
            None if kind.warns_on_unmatched_removal() => diagnostics.push(
                DiagnosticCode::RemovalNotFound,
                kind.field(),
                format!("No entry matching \"{}\" to remove", removal.trim()),
            ),
            None => {}
        }
    }

    result.extend(
        changes
            .added
            .iter()
            .map(|addition| addition.trim())
            .filter(|addition| !addition.is_empty())
            .map(str::to_string),
    );

    result
}

pub fn apply_inventory_changes(current: &[String], changes: &LedgerChanges, diagnostics: &mut Diagnostics) -> Vec<String> {
    apply_ledger_changes(LedgerKind::Inventory, current, changes, diagnostics)
}

pub fn apply_health_changes(current: &[String], changes: &LedgerChanges, diagnostics: &mut Diagnostics) -> Vec<String> {
    apply_ledger_changes(LedgerKind::Health, current, changes, diagnostics)
}

pub fn apply_accumulated_state_changes(
    current: &[String],
    changes: &LedgerChanges,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    apply_ledger_changes(LedgerKind::AccumulatedState, current, changes, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn inventory_additions_are_not_deduplicated() {
        let mut diagnostics = Diagnostics::new();
        let changes = LedgerChanges::new(strings(&["Sword", "sword"]), vec![]);

        let inventory = apply_inventory_changes(&[], &changes, &mut diagnostics);

        assert_eq!(inventory, strings(&["Sword", "sword"]));
    }

    #[test]
    fn removal_takes_first_case_insensitive_match_only() {
        let mut diagnostics = Diagnostics::new();
        let current = strings(&["Sword", "sword", "Shield"]);
        let changes = LedgerChanges::new(vec![], strings(&["SWORD"]));

        let inventory = apply_inventory_changes(&current, &changes, &mut diagnostics);

        assert_eq!(inventory, strings(&["sword", "Shield"]));
    }

    #[test]
    fn inventory_misses_are_silent() {
        let mut diagnostics = Diagnostics::new();
        let changes = LedgerChanges::new(vec![], strings(&["Lantern"]));

        let inventory = apply_inventory_changes(&strings(&["Rope"]), &changes, &mut diagnostics);

        assert_eq!(inventory, strings(&["Rope"]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn health_and_accumulated_misses_warn() {
        let mut diagnostics = Diagnostics::new();
        let changes = LedgerChanges::new(vec![], strings(&["Fever", "  "]));

        apply_health_changes(&strings(&["Bruised ribs"]), &changes, &mut diagnostics);
        apply_accumulated_state_changes(&[], &changes, &mut diagnostics);

        assert_eq!(diagnostics.count(DiagnosticCode::RemovalNotFound), 2);
        let fields: Vec<_> = diagnostics.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["health", "accumulatedState"]);
    }

    #[test]
    fn additions_are_trimmed_and_blank_dropped() {
        let mut diagnostics = Diagnostics::new();
        let changes = LedgerChanges::new(strings(&["  Sprained   ankle ", "", "   "]), vec![]);

        let health = apply_health_changes(&[], &changes, &mut diagnostics);

        assert_eq!(health, strings(&["Sprained   ankle"]));
    }

    #[test]
    fn removal_matches_across_whitespace_differences() {
        let mut diagnostics = Diagnostics::new();
        let changes = LedgerChanges::new(vec![], strings(&["sprained ankle"]));

        let health = apply_health_changes(&strings(&["Sprained   ankle"]), &changes, &mut diagnostics);

        assert!(health.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn same_change_set_add_and_remove_keeps_new_item() {
        let mut diagnostics = Diagnostics::new();
        let changes = LedgerChanges::new(strings(&["Torch"]), strings(&["torch"]));

        let inventory = apply_inventory_changes(&strings(&["Torch"]), &changes, &mut diagnostics);

        assert_eq!(inventory, strings(&["Torch"]));
    }
}
