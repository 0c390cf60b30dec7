//! Story aggregate: identity plus branch-independent canon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::StoryId;
use crate::reconciliation::ReconciledStateDelta;
use crate::state::{merge_character_canon, merge_world_canon, CharacterCanon};

/// A story. Canon lives here rather than on pages, so every branch sees
/// facts established on any other branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    id: StoryId,
    title: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    world_canon: Vec<String>,
    #[serde(default)]
    character_canon: CharacterCanon,
}

impl Story {
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("Story title cannot be empty"));
        }
        Ok(Self {
            id: StoryId::new(),
            title,
            created_at: now,
            world_canon: Vec::new(),
            character_canon: CharacterCanon::new(),
        })
    }

    pub fn id(&self) -> StoryId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn world_canon(&self) -> &[String] {
        &self.world_canon
    }

    pub fn character_canon(&self) -> &CharacterCanon {
        &self.character_canon
    }

    /// Append the delta's canon facts. Existing facts are never removed.
    pub fn with_canon_from(mut self, delta: &ReconciledStateDelta) -> Self {
        self.world_canon = merge_world_canon(&self.world_canon, &delta.world_canon_added);
        self.character_canon = merge_character_canon(&self.character_canon, &delta.character_canon_added);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CharacterStateIntent;

    #[test]
    fn rejects_blank_titles() {
        assert!(Story::new("   ", Utc::now()).is_err());
        assert_eq!(Story::new(" The Ember Road ", Utc::now()).unwrap().title(), "The Ember Road");
    }

    #[test]
    fn canon_accumulates_across_merges() {
        let story = Story::new("The Ember Road", Utc::now()).unwrap();

        let mut first = ReconciledStateDelta::default();
        first.world_canon_added = vec!["The capital fell in winter".to_string()];
        first.character_canon_added = vec![CharacterStateIntent::new("Aria", vec!["A former smuggler".to_string()])];

        let mut second = ReconciledStateDelta::default();
        second.world_canon_added = vec!["the capital fell in WINTER".to_string(), "Ravens carry mail".to_string()];

        let story = story.with_canon_from(&first).with_canon_from(&second);

        assert_eq!(story.world_canon(), ["The capital fell in winter", "Ravens carry mail"]);
        assert_eq!(story.character_canon()["aria"].facts, vec!["A former smuggler"]);
    }
}
