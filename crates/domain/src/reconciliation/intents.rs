//! Raw state intents as a generation stage emits them.
//!
//! Every field is optional and sub-types are plain strings: an unexpected
//! value must survive deserialization so reconciliation can drop it instead
//! of failing the whole stage output. Wrongly typed scalars decode as empty
//! strings and malformed list items are skipped one by one.

use serde::{Deserialize, Serialize};

use crate::state::CharacterStateIntent;

/// Field decoders that never reject a value of the wrong JSON type.
mod lenient {
    use serde::de::{Deserializer, IgnoredAny};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose<T> {
        Value(T),
        Other(IgnoredAny),
    }

    impl<T> Loose<T> {
        fn into_value(self) -> Option<T> {
            match self {
                Loose::Value(value) => Some(value),
                Loose::Other(IgnoredAny) => None,
            }
        }
    }

    /// Non-strings (null, numbers, objects) become `""`.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Loose::<String>::deserialize(deserializer)?
            .into_value()
            .unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Loose::<String>::deserialize(deserializer)?.into_value())
    }

    /// Items that do not decode as `T` are dropped; a non-array is empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Loose::<Vec<Loose<T>>>::deserialize(deserializer)?
            .into_value()
            .unwrap_or_default()
            .into_iter()
            .filter_map(Loose::into_value)
            .collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateIntents {
    #[serde(deserialize_with = "lenient::optional_string")]
    pub current_location: Option<String>,
    pub threats: ThreatIntents,
    pub constraints: ConstraintIntents,
    pub threads: ThreadIntents,
    pub inventory: TextListIntents,
    pub health: TextListIntents,
    pub accumulated_state: TextListIntents,
    pub character_state: CharacterStateIntents,
    pub canon: CanonIntents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreatIntents {
    #[serde(deserialize_with = "lenient::list")]
    pub add: Vec<ThreatAddIntent>,
    #[serde(deserialize_with = "lenient::list")]
    pub remove_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreatAddIntent {
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub threat_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintIntents {
    #[serde(deserialize_with = "lenient::list")]
    pub add: Vec<ConstraintAddIntent>,
    #[serde(deserialize_with = "lenient::list")]
    pub remove_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintAddIntent {
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub constraint_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadIntents {
    #[serde(deserialize_with = "lenient::list")]
    pub add: Vec<ThreadAddIntent>,
    #[serde(deserialize_with = "lenient::list")]
    pub resolve_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadAddIntent {
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(deserialize_with = "lenient::string")]
    pub thread_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub urgency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextListIntents {
    #[serde(deserialize_with = "lenient::list")]
    pub add: Vec<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStateIntents {
    #[serde(deserialize_with = "lenient::list")]
    pub add: Vec<CharacterStateIntent>,
    #[serde(deserialize_with = "lenient::list")]
    pub remove: Vec<CharacterStateIntent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonIntents {
    #[serde(deserialize_with = "lenient::list")]
    pub world_facts: Vec<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub character_facts: Vec<CharacterStateIntent>,
}
