//! Value objects - Immutable objects defined by their attributes

mod diagnostics;
mod intent_kinds;
mod intent_text;
mod tagged_entry;

pub use diagnostics::{DiagnosticCode, Diagnostics, StateReconciliationDiagnostic};
pub use intent_kinds::{is_constraint_type, is_threat_type, ConstraintType, ThreadType, ThreatType, Urgency};
pub use intent_text::{
    dedupe_by_key, intent_comparison_key, normalize_intent_text, normalize_text_entries, normalize_text_list,
    text_key,
};
pub use tagged_entry::{
    extract_prefix_from_removal, parse_tagged_entry, EntryCategory, EntryIdAllocator,
    TaggedStateEntry,
};
