//! Per-character state (branch-local) and canon facts (story-wide).
//!
//! Both are grouped by a case- and whitespace-insensitive character key. The
//! first normalized spelling of a name is the one displayed.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::value_objects::{intent_comparison_key, normalize_intent_text, DiagnosticCode, Diagnostics};

/// Character states or facts as emitted by a stage, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterStateIntent {
    pub character_name: String,
    #[serde(alias = "facts")]
    pub states: Vec<String>,
}

impl CharacterStateIntent {
    pub fn new(character_name: impl Into<String>, states: Vec<String>) -> Self {
        Self {
            character_name: character_name.into(),
            states,
        }
    }
}

/// Normalized states for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledCharacterStateAdd {
    pub character_name: String,
    pub states: Vec<String>,
}

/// Current states keyed by the character's comparison key.
pub type CharacterStateMap = BTreeMap<String, ReconciledCharacterStateAdd>;

/// Canon facts for one character. Facts are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterCanonEntry {
    pub character_name: String,
    pub facts: Vec<String>,
}

/// Canon keyed by the character's comparison key.
pub type CharacterCanon = BTreeMap<String, CharacterCanonEntry>;

/// Group additions by character, dedupe each character's states, and drop
/// characters left with nothing.
pub fn normalize_character_state_adds(additions: &[CharacterStateIntent]) -> Vec<ReconciledCharacterStateAdd> {
    let mut groups: Vec<ReconciledCharacterStateAdd> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for addition in additions {
        let name = normalize_intent_text(&addition.character_name);
        if name.is_empty() {
            continue;
        }
        let index = *index_by_key
            .entry(intent_comparison_key(&name))
            .or_insert_with(|| {
                groups.push(ReconciledCharacterStateAdd {
                    character_name: name.clone(),
                    states: Vec::new(),
                });
                groups.len() - 1
            });
        merge_unique(&mut groups[index].states, &addition.states);
    }

    groups.retain(|group| !group.states.is_empty());
    groups
}

/// Removals share the add normalization: grouped, deduped, empties dropped.
pub fn normalize_character_state_removals(removals: &[CharacterStateIntent]) -> Vec<ReconciledCharacterStateAdd> {
    normalize_character_state_adds(removals)
}

/// Apply removals, then merge additions into the per-character lists.
///
/// A character whose list becomes empty is dropped from the map.
pub fn apply_character_state_changes(
    current: &CharacterStateMap,
    additions: &[ReconciledCharacterStateAdd],
    removals: &[ReconciledCharacterStateAdd],
    diagnostics: &mut Diagnostics,
) -> CharacterStateMap {
    let mut result = current.clone();

    for removal in removals {
        let key = intent_comparison_key(&removal.character_name);
        let Some(entry) = result.get_mut(&key) else {
            diagnostics.push(
                DiagnosticCode::RemovalNotFound,
                "characterState",
                format!("No state recorded for character \"{}\"", removal.character_name),
            );
            continue;
        };
        for state in &removal.states {
            let state_key = intent_comparison_key(state);
            match entry.states.iter().position(|s| intent_comparison_key(s) == state_key) {
                Some(index) => {
                    entry.states.remove(index);
                }
                None => diagnostics.push(
                    DiagnosticCode::RemovalNotFound,
                    "characterState",
                    format!("Character \"{}\" has no state \"{}\"", entry.character_name, state),
                ),
            }
        }
        if entry.states.is_empty() {
            result.remove(&key);
        }
    }

    for addition in additions {
        let entry = result
            .entry(intent_comparison_key(&addition.character_name))
            .or_insert_with(|| ReconciledCharacterStateAdd {
                character_name: addition.character_name.clone(),
                states: Vec::new(),
            });
        merge_unique(&mut entry.states, &addition.states);
    }

    result
}

/// Append-only merge of character canon facts.
pub fn merge_character_canon(current: &CharacterCanon, additions: &[CharacterStateIntent]) -> CharacterCanon {
    let mut result = current.clone();
    for group in normalize_character_state_adds(additions) {
        let entry = result
            .entry(intent_comparison_key(&group.character_name))
            .or_insert_with(|| CharacterCanonEntry {
                character_name: group.character_name.clone(),
                facts: Vec::new(),
            });
        merge_unique(&mut entry.facts, &group.states);
    }
    result
}

/// Append-only merge of world canon facts.
pub fn merge_world_canon(current: &[String], additions: &[String]) -> Vec<String> {
    let mut result = current.to_vec();
    merge_unique(&mut result, additions);
    result
}

/// Append normalized values whose comparison key is not already present.
fn merge_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        let normalized = normalize_intent_text(value);
        if normalized.is_empty() {
            continue;
        }
        let key = intent_comparison_key(&normalized);
        if !target.iter().any(|existing| intent_comparison_key(existing) == key) {
            target.push(normalized);
        }
    }
}
