//! Turns raw stage intents into a validated, deduplicated state delta.
//!
//! Nothing here fails. Unknown ids become `UNKNOWN_STATE_ID` diagnostics and
//! are dropped; unrecognized sub-types and blank text are dropped silently.
//! Ledger lists (inventory, health, accumulated state) keep repeats, since
//! identical items may legitimately accumulate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::intents::StateIntents;
use crate::state::{
    normalize_character_state_adds, normalize_character_state_removals, ActiveState,
    ActiveStateChanges, CharacterStateIntent, ReconciledCharacterStateAdd,
};
use crate::value_objects::{
    dedupe_by_key, intent_comparison_key, normalize_intent_text, normalize_text_entries, normalize_text_list,
    ConstraintType, DiagnosticCode, Diagnostics, EntryCategory, EntryIdAllocator,
    StateReconciliationDiagnostic, TaggedStateEntry, ThreadType, ThreatType, Urgency,
};

/// Ids that remove/resolve references may point at, per reconciliation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownStateIds {
    pub threats: HashSet<String>,
    pub constraints: HashSet<String>,
    pub threads: HashSet<String>,
}

impl KnownStateIds {
    pub fn from_active_state(state: &ActiveState) -> Self {
        let collect = |category: EntryCategory| -> HashSet<String> {
            state.prefixes(category).map(str::to_string).collect()
        };
        Self {
            threats: collect(EntryCategory::Threat),
            constraints: collect(EntryCategory::Constraint),
            threads: collect(EntryCategory::Thread),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledThreat {
    pub text: String,
    pub threat_type: ThreatType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledConstraint {
    pub text: String,
    pub constraint_type: ConstraintType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledThread {
    pub text: String,
    pub thread_type: ThreadType,
    pub urgency: Urgency,
}

/// The applicable delta for one page, plus the findings that shaped it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciledStateDelta {
    pub current_location: Option<String>,
    pub threats_added: Vec<ReconciledThreat>,
    pub threats_removed: Vec<String>,
    pub constraints_added: Vec<ReconciledConstraint>,
    pub constraints_removed: Vec<String>,
    pub threads_added: Vec<ReconciledThread>,
    pub threads_resolved: Vec<String>,
    pub inventory_added: Vec<String>,
    pub inventory_removed: Vec<String>,
    pub health_added: Vec<String>,
    pub health_removed: Vec<String>,
    pub accumulated_state_added: Vec<String>,
    pub accumulated_state_removed: Vec<String>,
    pub character_state_added: Vec<ReconciledCharacterStateAdd>,
    pub character_state_removed: Vec<ReconciledCharacterStateAdd>,
    pub world_canon_added: Vec<String>,
    pub character_canon_added: Vec<CharacterStateIntent>,
    pub diagnostics: Vec<StateReconciliationDiagnostic>,
}

impl ReconciledStateDelta {
    /// Assign fresh tagged ids to new threats, constraints and threads and
    /// express the delta as wire-level active state changes.
    pub fn to_active_state_changes(&self, current: &ActiveState) -> ActiveStateChanges {
        let mut threats = EntryIdAllocator::for_entries(EntryCategory::Threat, &current.active_threats);
        let mut constraints =
            EntryIdAllocator::for_entries(EntryCategory::Constraint, &current.active_constraints);
        let mut threads = EntryIdAllocator::for_entries(EntryCategory::Thread, &current.open_threads);

        ActiveStateChanges {
            new_location: self.current_location.clone(),
            threats_added: self
                .threats_added
                .iter()
                .filter_map(|t| encode_entry(threats.allocate(), &t.text))
                .collect(),
            threats_removed: self.threats_removed.clone(),
            constraints_added: self
                .constraints_added
                .iter()
                .filter_map(|c| encode_entry(constraints.allocate(), &c.text))
                .collect(),
            constraints_removed: self.constraints_removed.clone(),
            threads_added: self
                .threads_added
                .iter()
                .filter_map(|t| encode_entry(threads.allocate(), &t.text))
                .collect(),
            threads_resolved: self.threads_resolved.clone(),
        }
    }

    pub fn has_canon_additions(&self) -> bool {
        !self.world_canon_added.is_empty() || !self.character_canon_added.is_empty()
    }
}

fn encode_entry(id: String, text: &str) -> Option<String> {
    TaggedStateEntry::new(id, text).ok().map(|entry| entry.raw())
}

/// Trim, dedupe, and keep only ids present in `known`.
///
/// Each rejected id adds one `UNKNOWN_STATE_ID` diagnostic.
pub fn normalize_and_validate_remove_ids(
    ids: &[String],
    known: &HashSet<String>,
    field: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let normalized = dedupe_by_key(ids.iter().map(|id| id.trim().to_string()), |id| {
        (!id.is_empty()).then(|| id.clone())
    });

    normalized
        .into_iter()
        .filter(|id| {
            let is_known = known.contains(id);
            if !is_known {
                diagnostics.push(
                    DiagnosticCode::UnknownStateId,
                    field,
                    format!("Unknown state id \"{}\" in {}", id, field),
                );
            }
            is_known
        })
        .collect()
}

/// Normalize, validate, and dedupe every intent field against `known`.
pub fn reconcile_state_intents(intents: &StateIntents, known: &KnownStateIds) -> ReconciledStateDelta {
    let mut diagnostics = Diagnostics::new();

    let threats_removed = normalize_and_validate_remove_ids(
        &intents.threats.remove_ids,
        &known.threats,
        "threats.removeIds",
        &mut diagnostics,
    );
    let constraints_removed = normalize_and_validate_remove_ids(
        &intents.constraints.remove_ids,
        &known.constraints,
        "constraints.removeIds",
        &mut diagnostics,
    );
    let threads_resolved = normalize_and_validate_remove_ids(
        &intents.threads.resolve_ids,
        &known.threads,
        "threads.resolveIds",
        &mut diagnostics,
    );

    let threats_added = dedupe_by_key(
        intents.threats.add.iter().filter_map(|add| {
            let threat_type = ThreatType::parse(&add.threat_type)?;
            let text = normalize_intent_text(&add.text);
            (!text.is_empty()).then_some(ReconciledThreat { text, threat_type })
        }),
        |t| Some((intent_comparison_key(&t.text), t.threat_type)),
    );

    let constraints_added = dedupe_by_key(
        intents.constraints.add.iter().filter_map(|add| {
            let constraint_type = ConstraintType::parse(&add.constraint_type)?;
            let text = normalize_intent_text(&add.text);
            (!text.is_empty()).then_some(ReconciledConstraint { text, constraint_type })
        }),
        |c| Some((intent_comparison_key(&c.text), c.constraint_type)),
    );

    let threads_added = dedupe_by_key(
        intents.threads.add.iter().filter_map(|add| {
            let thread_type = ThreadType::parse(&add.thread_type)?;
            let urgency = Urgency::parse(&add.urgency)?;
            let text = normalize_intent_text(&add.text);
            (!text.is_empty()).then_some(ReconciledThread {
                text,
                thread_type,
                urgency,
            })
        }),
        |t| Some((intent_comparison_key(&t.text), t.thread_type)),
    );

    let current_location = intents
        .current_location
        .as_deref()
        .map(normalize_intent_text)
        .filter(|location| !location.is_empty());

    ReconciledStateDelta {
        current_location,
        threats_added,
        threats_removed,
        constraints_added,
        constraints_removed,
        threads_added,
        threads_resolved,
        inventory_added: normalize_text_entries(&intents.inventory.add),
        inventory_removed: normalize_text_entries(&intents.inventory.remove),
        health_added: normalize_text_entries(&intents.health.add),
        health_removed: normalize_text_entries(&intents.health.remove),
        accumulated_state_added: normalize_text_entries(&intents.accumulated_state.add),
        accumulated_state_removed: normalize_text_entries(&intents.accumulated_state.remove),
        character_state_added: normalize_character_state_adds(&intents.character_state.add),
        character_state_removed: normalize_character_state_removals(&intents.character_state.remove),
        world_canon_added: normalize_text_list(&intents.canon.world_facts),
        character_canon_added: normalize_character_state_adds(&intents.canon.character_facts)
            .into_iter()
            .map(|group| CharacterStateIntent::new(group.character_name, group.states))
            .collect(),
        diagnostics: diagnostics.into_vec(),
    }
}
