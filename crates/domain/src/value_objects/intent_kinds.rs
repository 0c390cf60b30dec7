//! Closed sub-type vocabularies declared by generation stages.
//!
//! Stages send these as free strings; `parse` is the type guard that decides
//! whether an intent survives reconciliation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! define_intent_kind {
    ($name:ident, $label:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Type guard: `Some` only for an exact wire value.
            pub fn parse(value: &str) -> Option<Self> {
                match value.trim() {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| DomainError::parse(format!("Unknown {}: {}", $label, s)))
            }
        }
    };
}

define_intent_kind!(ThreatType, "threat type", {
    HostileAgent => "HOSTILE_AGENT",
    Creature => "CREATURE",
    Environmental => "ENVIRONMENTAL",
    Ambush => "AMBUSH",
    Pursuit => "PURSUIT",
    Trap => "TRAP",
    Social => "SOCIAL",
});

define_intent_kind!(ConstraintType, "constraint type", {
    Physical => "PHYSICAL",
    Environmental => "ENVIRONMENTAL",
    Social => "SOCIAL",
    Temporal => "TEMPORAL",
    Resource => "RESOURCE",
});

define_intent_kind!(ThreadType, "thread type", {
    Mystery => "MYSTERY",
    Quest => "QUEST",
    Relationship => "RELATIONSHIP",
    Danger => "DANGER",
    Information => "INFORMATION",
    Resource => "RESOURCE",
    Moral => "MORAL",
});

define_intent_kind!(Urgency, "urgency", {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
});

pub fn is_threat_type(value: &str) -> bool {
    ThreatType::parse(value).is_some()
}

pub fn is_constraint_type(value: &str) -> bool {
    ConstraintType::parse(value).is_some()
}
