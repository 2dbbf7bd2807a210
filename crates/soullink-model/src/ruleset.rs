//! Rulesets referenced by `rulesetId`
//!
//! The tracker does not own rulesets; a document only copies the rule text
//! at creation time and keeps the id as a reference.

use serde::{Deserialize, Serialize};

/// Named list of rule strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    /// Ruleset id
    pub id: String,
    /// Display name
    pub name: String,
    /// Rule text, display only
    pub rules: Vec<String>,
}

const STANDARD_RULES: [&str; 5] = [
    "Only the first encounter on each route may be caught.",
    "A fainted Pokémon is dead and goes to the graveyard.",
    "Encounters are linked across players; if one dies, its partner dies too.",
    "Linked Pokémon may not share a primary type within one team.",
    "Nicknames are mandatory.",
];

const HARDCORE_RULES: [&str; 3] = [
    "Items may not be used in battle.",
    "The battle style is set to \"Set\".",
    "Level caps may not be exceeded.",
];

impl Ruleset {
    /// Create ruleset
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, rules: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rules,
        }
    }

    /// Built-in ruleset catalogue
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        let standard: Vec<String> = STANDARD_RULES.iter().map(ToString::to_string).collect();
        let hardcore = standard
            .iter()
            .cloned()
            .chain(HARDCORE_RULES.iter().map(ToString::to_string))
            .collect();

        vec![
            Self::new("standard", "Standard Soullink", standard),
            Self::new("hardcore", "Hardcore Soullink", hardcore),
            Self::new("custom", "Custom", Vec::new()),
        ]
    }

    /// Look up built-in ruleset by id
    #[must_use]
    pub fn find(id: &str) -> Option<Self> {
        Self::builtin().into_iter().find(|r| r.id == id)
    }
}
