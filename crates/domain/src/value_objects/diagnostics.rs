//! Non-fatal findings raised while reconciling or applying state changes.
//!
//! Validation problems in generated intents are never errors. They are
//! collected here and handed back to the caller next to the result.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A remove/resolve id is not among the currently known ids
    UnknownStateId,
    /// A tagged entry has no `:` separator or an unknown category prefix
    MalformedTaggedEntry,
    /// A tagged entry was added to a field of another category
    CategoryMismatch,
    /// A removal matched nothing in the current state
    RemovalNotFound,
    /// A removal carried a description; only the prefix was used
    RemovalDescriptionIgnored,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownStateId => "UNKNOWN_STATE_ID",
            Self::MalformedTaggedEntry => "MALFORMED_TAGGED_ENTRY",
            Self::CategoryMismatch => "CATEGORY_MISMATCH",
            Self::RemovalNotFound => "REMOVAL_NOT_FOUND",
            Self::RemovalDescriptionIgnored => "REMOVAL_DESCRIPTION_IGNORED",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding: which rule fired, on which field, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReconciliationDiagnostic {
    pub code: DiagnosticCode,
    pub field: String,
    pub message: String,
}

impl fmt::Display for StateReconciliationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

/// Collector threaded through every apply/validate call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<StateReconciliationDiagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: DiagnosticCode, field: impl Into<String>, message: impl Into<String>) {
        self.entries.push(StateReconciliationDiagnostic {
            code,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateReconciliationDiagnostic> {
        self.entries.iter()
    }

    /// Number of findings carrying `code`.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    pub fn into_vec(self) -> Vec<StateReconciliationDiagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_wire_form() {
        let json = serde_json::to_string(&DiagnosticCode::UnknownStateId).unwrap();
        assert_eq!(json, "\"UNKNOWN_STATE_ID\"");
        assert_eq!(DiagnosticCode::CategoryMismatch.to_string(), "CATEGORY_MISMATCH");
    }

    #[test]
    fn collector_counts_by_code() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DiagnosticCode::RemovalNotFound, "health", "no match for \"cold\"");
        diagnostics.push(DiagnosticCode::UnknownStateId, "threats.removeIds", "THREAT_9");
        diagnostics.push(DiagnosticCode::RemovalNotFound, "health", "no match for \"flu\"");

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.count(DiagnosticCode::RemovalNotFound), 2);
        assert_eq!(diagnostics.count(DiagnosticCode::CategoryMismatch), 0);
    }
}
