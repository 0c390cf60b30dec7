//! Text normalization for generated intents.
//!
//! Every case- or whitespace-insensitive comparison in the state appliers goes
//! through [`intent_comparison_key`]. Raw strings are never compared directly.

use std::collections::HashSet;
use std::hash::Hash;

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_intent_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded normalized text. Used as a match key, never for display.
pub fn intent_comparison_key(value: &str) -> String {
    normalize_intent_text(value).to_lowercase()
}

/// Keep the first item seen for each key, preserving input order.
///
/// Items whose key is `None` are dropped.
pub fn dedupe_by_key<T, K, F>(values: impl IntoIterator<Item = T>, mut key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> Option<K>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| match key_fn(value) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}

/// Key function for [`dedupe_by_key`] over plain text: empty text has no key.
pub fn text_key<S: AsRef<str>>(value: &S) -> Option<String> {
    let key = intent_comparison_key(value.as_ref());
    (!key.is_empty()).then_some(key)
}

/// Normalize every entry and drop empties. Repeats are kept.
pub fn normalize_text_entries(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| normalize_intent_text(v))
        .filter(|v| !v.is_empty())
        .collect()
}

/// Normalize every entry, dropping empties and case-insensitive repeats.
pub fn normalize_text_list(values: &[String]) -> Vec<String> {
    dedupe_by_key(values.iter().map(|v| normalize_intent_text(v)), text_key)
}
