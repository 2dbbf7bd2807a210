//! Linked pairs: one soul link across all players

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable, creation-order-unique pair identifier
pub type PairId = u64;

/// One player's side of a linked pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Species (or other display name)
    pub name: String,
    /// Player-chosen nickname
    pub nickname: String,
}

impl Member {
    /// Create member
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nickname: nickname.into(),
        }
    }

    /// Check if both fields are blank
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.nickname.trim().is_empty()
    }
}

/// Cross-player soul link
///
/// `members[i]` belongs to player `i`. A pair whose route and members are all
/// blank is a *hole*: it keeps its place (the UI may render it as an empty
/// team slot) but carries no data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPair {
    /// Stable identifier
    pub id: PairId,
    /// Route / location where the encounter happened
    pub route: String,
    /// One member per player index
    pub members: Vec<Member>,
}

impl LinkedPair {
    /// Create pair
    #[inline]
    #[must_use]
    pub fn new(id: PairId, route: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            id,
            route: route.into(),
            members,
        }
    }

    /// Create hole with one blank member per player
    #[inline]
    #[must_use]
    pub fn empty(id: PairId, players: usize) -> Self {
        Self {
            id,
            route: String::new(),
            members: vec![Member::default(); players],
        }
    }

    /// Check if pair carries no data
    #[must_use]
    pub fn is_hole(&self) -> bool {
        self.route.trim().is_empty() && self.members.iter().all(Member::is_empty)
    }

    /// Member for player index
    #[inline]
    #[must_use]
    pub fn member(&self, player: usize) -> Option<&Member> {
        self.members.get(player)
    }

    /// Pad or truncate members to `players` entries, keeping index alignment
    pub fn resize_members(&mut self, players: usize) {
        self.members.resize_with(players, Member::default);
    }
}

/// Sequence a pair lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    /// Active party (capacity bounded)
    Team,
    /// Storage box
    Box,
    /// Lost pairs
    Graveyard,
}

impl Slot {
    /// All slots in lookup order
    pub const ALL: [Slot; 3] = [Slot::Team, Slot::Box, Slot::Graveyard];

    /// Wire name of slot
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Box => "box",
            Self::Graveyard => "graveyard",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "team" => Ok(Self::Team),
            "box" => Ok(Self::Box),
            "graveyard" => Ok(Self::Graveyard),
            _ => Err(ModelError::InvalidSlot(s.to_string())),
        }
    }
}
