//! Category-tagged active state entries.
//!
//! On the wire an entry is a single string, `"THREAT_3: A guard approaches"`.
//! In memory the category, the stable id and the display text are separate
//! fields; [`TaggedStateEntry::raw`] and [`parse_tagged_entry`] convert
//! between the two, so persisted pages stay readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::diagnostics::{DiagnosticCode, Diagnostics};
use crate::error::DomainError;

/// The closed set of tagged entry categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryCategory {
    Threat,
    Constraint,
    Thread,
}

impl EntryCategory {
    pub const ALL: [Self; 3] = [Self::Threat, Self::Constraint, Self::Thread];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threat => "THREAT",
            Self::Constraint => "CONSTRAINT",
            Self::Thread => "THREAD",
        }
    }

    /// Category of a `CATEGORY_<suffix>` prefix. The suffix must be non-empty.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let (category, suffix) = prefix.split_once('_')?;
        if suffix.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|c| c.as_str() == category)
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active threat, constraint, or open thread.
///
/// The id (`THREAT_3`) is the entry's identity; removal matches it exactly and
/// never looks at the description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaggedStateEntry {
    category: EntryCategory,
    id: String,
    description: String,
}

impl TaggedStateEntry {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into().trim().to_string();
        let category = EntryCategory::from_prefix(&id)
            .ok_or_else(|| DomainError::parse(format!("Unknown tagged entry prefix: {}", id)))?;
        Ok(Self {
            category,
            id,
            description: description.into().trim().to_string(),
        })
    }

    pub fn category(&self) -> EntryCategory {
        self.category
    }

    /// The stable identifier, also the wire prefix.
    pub fn prefix(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Wire encoding: `"<prefix>: <description>"`.
    ///
    /// Spacing is canonical: exactly one space after the colon and a trimmed
    /// description, whatever spacing the entry was parsed from. Prefix and
    /// description survive a round trip; the original text does not.
    pub fn raw(&self) -> String {
        format!("{}: {}", self.id, self.description)
    }
}

impl fmt::Display for TaggedStateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.description)
    }
}

impl FromStr for TaggedStateEntry {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (prefix, description) = raw
            .split_once(':')
            .ok_or_else(|| DomainError::parse(format!("Tagged entry has no ':' separator: {}", raw)))?;
        Self::new(prefix, description)
    }
}

impl Serialize for TaggedStateEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw())
    }
}

impl<'de> Deserialize<'de> for TaggedStateEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Decode a wire entry, recording a warning on failure.
pub fn parse_tagged_entry(raw: &str, field: &str, diagnostics: &mut Diagnostics) -> Option<TaggedStateEntry> {
    match raw.parse::<TaggedStateEntry>() {
        Ok(entry) => Some(entry),
        Err(err) => {
            diagnostics.push(DiagnosticCode::MalformedTaggedEntry, field, err.to_string());
            None
        }
    }
}

/// Removal key from either `"THREAT_1"` or `"THREAT_1: description"`.
///
/// A trailing description is discarded with a warning.
pub fn extract_prefix_from_removal(removal: &str, field: &str, diagnostics: &mut Diagnostics) -> Option<String> {
    let trimmed = removal.trim();
    let prefix = match trimmed.split_once(':') {
        Some((prefix, _)) => {
            diagnostics.push(
                DiagnosticCode::RemovalDescriptionIgnored,
                field,
                format!("Removal \"{}\" carries a description; using prefix only", trimmed),
            );
            prefix.trim()
        }
        None => trimmed,
    };
    (!prefix.is_empty()).then(|| prefix.to_string())
}

/// Hands out fresh `CATEGORY_<n>` ids, never reusing a suffix already present.
#[derive(Debug, Clone)]
pub struct EntryIdAllocator {
    category: EntryCategory,
    next: u32,
}

impl EntryIdAllocator {
    pub fn for_entries(category: EntryCategory, existing: &[TaggedStateEntry]) -> Self {
        let highest = existing
            .iter()
            .filter(|entry| entry.category() == category)
            .filter_map(|entry| entry.prefix().split_once('_'))
            .filter_map(|(_, suffix)| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Self {
            category,
            next: highest.saturating_add(1),
        }
    }

    pub fn allocate(&mut self) -> String {
        let id = format!("{}_{}", self.category.as_str(), self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
