//! Active threats, constraints, and open threads, plus the current location.

use serde::{Deserialize, Serialize};

use crate::value_objects::{
    extract_prefix_from_removal, normalize_intent_text, parse_tagged_entry, DiagnosticCode,
    Diagnostics, EntryCategory, TaggedStateEntry,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveState {
    #[serde(default)]
    pub current_location: String,
    #[serde(default)]
    pub active_threats: Vec<TaggedStateEntry>,
    #[serde(default)]
    pub active_constraints: Vec<TaggedStateEntry>,
    #[serde(default)]
    pub open_threads: Vec<TaggedStateEntry>,
}

impl ActiveState {
    pub fn entries(&self, category: EntryCategory) -> &[TaggedStateEntry] {
        match category {
            EntryCategory::Threat => &self.active_threats,
            EntryCategory::Constraint => &self.active_constraints,
            EntryCategory::Thread => &self.open_threads,
        }
    }

    /// Prefixes currently in play for `category`.
    pub fn prefixes(&self, category: EntryCategory) -> impl Iterator<Item = &str> {
        self.entries(category).iter().map(TaggedStateEntry::prefix)
    }
}

/// Declared mutations for [`apply_active_state_changes`].
///
/// Additions are wire-encoded tagged entries; removals are prefixes (a
/// trailing description is tolerated and ignored).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveStateChanges {
    pub new_location: Option<String>,
    pub threats_added: Vec<String>,
    pub threats_removed: Vec<String>,
    pub constraints_added: Vec<String>,
    pub constraints_removed: Vec<String>,
    pub threads_added: Vec<String>,
    pub threads_resolved: Vec<String>,
}

impl ActiveStateChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Compute the next active state. Pure: the same inputs always give the same
/// output, and nothing outside the arguments is consulted.
pub fn apply_active_state_changes(
    current: &ActiveState,
    changes: &ActiveStateChanges,
    diagnostics: &mut Diagnostics,
) -> ActiveState {
    let current_location = changes
        .new_location
        .as_deref()
        .map(normalize_intent_text)
        .filter(|location| !location.is_empty())
        .unwrap_or_else(|| current.current_location.clone());

    ActiveState {
        current_location,
        active_threats: apply_category_changes(
            EntryCategory::Threat,
            "activeThreats",
            &current.active_threats,
            &changes.threats_removed,
            &changes.threats_added,
            diagnostics,
        ),
        active_constraints: apply_category_changes(
            EntryCategory::Constraint,
            "activeConstraints",
            &current.active_constraints,
            &changes.constraints_removed,
            &changes.constraints_added,
            diagnostics,
        ),
        open_threads: apply_category_changes(
            EntryCategory::Thread,
            "openThreads",
            &current.open_threads,
            &changes.threads_resolved,
            &changes.threads_added,
            diagnostics,
        ),
    }
}

fn apply_category_changes(
    category: EntryCategory,
    field: &str,
    entries: &[TaggedStateEntry],
    removals: &[String],
    additions: &[String],
    diagnostics: &mut Diagnostics,
) -> Vec<TaggedStateEntry> {
    let mut result = entries.to_vec();

    for removal in removals {
        let Some(prefix) = extract_prefix_from_removal(removal, field, diagnostics) else {
            continue;
        };
        match result.iter().position(|entry| entry.prefix() == prefix) {
            Some(index) => {
                result.remove(index);
            }
            None => diagnostics.push(
                DiagnosticCode::RemovalNotFound,
                field,
                format!("No entry with prefix \"{}\" to remove", prefix),
            ),
        }
    }

    for addition in additions {
        let Some(entry) = parse_tagged_entry(addition, field, diagnostics) else {
            continue;
        };
        if entry.category() != category {
            diagnostics.push(
                DiagnosticCode::CategoryMismatch,
                field,
                format!("{} entry \"{}\" cannot be added to {}", entry.category(), entry.prefix(), field),
            );
            continue;
        }
        result.push(entry);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(raw: &str) -> TaggedStateEntry {
        raw.parse().unwrap()
    }

    fn sample_state() -> ActiveState {
        ActiveState {
            current_location: "The old mill".to_string(),
            active_threats: vec![entry("THREAT_1: Wolves circle the mill"), entry("THREAT_2: The miller lies")],
            active_constraints: vec![entry("CONSTRAINT_1: Night has fallen")],
            open_threads: vec![entry("THREAD_1: Who burned the granary?")],
        }
    }

    #[test]
    fn removes_exactly_the_matching_prefix() {
        let current = sample_state();
        let changes = ActiveStateChanges {
            threats_removed: vec!["THREAT_1".to_string()],
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let next = apply_active_state_changes(&current, &changes, &mut diagnostics);

        assert_eq!(next.active_threats, vec![entry("THREAT_2: The miller lies")]);
        assert_eq!(next.active_constraints, current.active_constraints);
        assert_eq!(next.open_threads, current.open_threads);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_prefix_is_a_warned_no_op() {
        let current = sample_state();
        let changes = ActiveStateChanges {
            threats_removed: vec!["THREAT_9".to_string()],
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let next = apply_active_state_changes(&current, &changes, &mut diagnostics);

        assert_eq!(next, current);
        assert_eq!(diagnostics.count(DiagnosticCode::RemovalNotFound), 1);
    }

    #[test]
    fn removal_matches_prefix_not_description() {
        let current = sample_state();
        let changes = ActiveStateChanges {
            threats_removed: vec!["Wolves circle the mill".to_string()],
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let next = apply_active_state_changes(&current, &changes, &mut diagnostics);

        assert_eq!(next.active_threats.len(), 2);
        assert_eq!(diagnostics.count(DiagnosticCode::RemovalNotFound), 1);
    }

    #[test]
    fn rejects_cross_category_and_malformed_additions() {
        let current = sample_state();
        let changes = ActiveStateChanges {
            constraints_added: vec![
                "THREAT_3: A sniper on the roof".to_string(),
                "no separator here".to_string(),
                "CONSTRAINT_2: The door is barred".to_string(),
            ],
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let next = apply_active_state_changes(&current, &changes, &mut diagnostics);

        assert_eq!(
            next.active_constraints,
            vec![entry("CONSTRAINT_1: Night has fallen"), entry("CONSTRAINT_2: The door is barred")]
        );
        assert_eq!(diagnostics.count(DiagnosticCode::CategoryMismatch), 1);
        assert_eq!(diagnostics.count(DiagnosticCode::MalformedTaggedEntry), 1);
    }

    #[test]
    fn removals_run_before_additions() {
        let current = sample_state();
        let changes = ActiveStateChanges {
            threads_added: vec!["THREAD_1: Who burned the granary? (new lead)".to_string()],
            threads_resolved: vec!["THREAD_1".to_string()],
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let next = apply_active_state_changes(&current, &changes, &mut diagnostics);

        assert_eq!(next.open_threads, vec![entry("THREAD_1: Who burned the granary? (new lead)")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn location_updates_only_when_present() {
        let current = sample_state();
        let mut diagnostics = Diagnostics::new();

        let unchanged = apply_active_state_changes(&current, &ActiveStateChanges::default(), &mut diagnostics);
        assert_eq!(unchanged.current_location, "The old mill");

        let moved = apply_active_state_changes(
            &current,
            &ActiveStateChanges {
                new_location: Some("  The   river ford ".to_string()),
                ..Default::default()
            },
            &mut diagnostics,
        );
        assert_eq!(moved.current_location, "The river ford");
    }

    #[test]
    fn application_is_deterministic() {
        let current = sample_state();
        let changes = ActiveStateChanges {
            new_location: Some("Cellar".to_string()),
            threats_added: vec!["THREAT_3: Smoke".to_string()],
            threats_removed: vec!["THREAT_2".to_string()],
            ..Default::default()
        };

        let first = apply_active_state_changes(&current, &changes, &mut Diagnostics::new());
        let second = apply_active_state_changes(&current, &changes, &mut Diagnostics::new());
        assert_eq!(first, second);
    }
}
