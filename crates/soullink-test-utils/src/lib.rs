//! Testing utilities for the soullink workspace
//!
//! Shared fixtures and document builders.

#![allow(missing_docs)]

use soullink_model::{
    GameTemplate, LinkedPair, Member, Milestone, RivalMilestone, Ruleset, Slot, TrackerDocument,
};

/// Fixed run start used by fixtures (2024-01-01T00:00:00Z)
pub const FIXTURE_STARTED_AT: i64 = 1_704_067_200_000;

pub fn player_names(count: usize) -> Vec<String> {
    ["Ash", "Misty", "Brock"]
        .iter()
        .take(count)
        .map(ToString::to_string)
        .collect()
}

/// Fresh two-player platinum document without pairs
pub fn two_player_document() -> TrackerDocument {
    DocumentBuilder::new().players(2).build()
}

/// Two-player document with pairs in every slot and some progress
pub fn fixture_document() -> TrackerDocument {
    DocumentBuilder::new()
        .players(2)
        .pair(Slot::Team, "Route 201", &[("Starly", "Wing"), ("Bidoof", "Teeth")])
        .pair(Slot::Team, "Route 202", &[("Shinx", "Spark"), ("Kricketot", "Bell")])
        .pair(Slot::Box, "Route 203", &[("Abra", "Zap"), ("Zubat", "Fang")])
        .pair(Slot::Graveyard, "Oreburgh Gate", &[("Geodude", "Rock"), ("Onix", "Tower")])
        .done_caps(2)
        .build()
}

/// Synthetic template with 10 numbered level caps and `rivals` rival caps
pub fn numbered_template(rivals: u32) -> GameTemplate {
    let caps = (1..=10)
        .map(|id| Milestone::new(id, format!("Cap {id}"), (id * 10).to_string()))
        .collect();
    let rival_caps = (1..=rivals)
        .map(|id| RivalMilestone::new(id, format!("Rival {id}"), (id * 5).to_string()))
        .collect();
    GameTemplate::new("numbered", "Numbered", caps, rival_caps)
}

/// Builder for test documents
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    template: GameTemplate,
    ruleset: Ruleset,
    players: usize,
    pairs: Vec<(Slot, LinkedPair)>,
    done_caps: usize,
    started_at: i64,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            template: GameTemplate::find("platinum").unwrap(),
            ruleset: Ruleset::find("standard").unwrap(),
            players: 2,
            pairs: Vec::new(),
            done_caps: 0,
            started_at: FIXTURE_STARTED_AT,
        }
    }

    pub fn template(mut self, template: GameTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn ruleset(mut self, id: &str) -> Self {
        self.ruleset = Ruleset::find(id).unwrap();
        self
    }

    pub fn players(mut self, count: usize) -> Self {
        self.players = count;
        self
    }

    pub fn started_at(mut self, ms: i64) -> Self {
        self.started_at = ms;
        self
    }

    /// Add pair; members beyond `members` are blank
    pub fn pair(mut self, slot: Slot, route: &str, members: &[(&str, &str)]) -> Self {
        let id = u64::try_from(self.pairs.len()).unwrap() + 1;
        let mut members: Vec<Member> = members.iter().map(|(n, k)| Member::new(*n, *k)).collect();
        members.truncate(self.players);
        let mut pair = LinkedPair::new(id, route, members);
        pair.resize_members(self.players);
        self.pairs.push((slot, pair));
        self
    }

    /// Mark the first `count` level caps done
    pub fn done_caps(mut self, count: usize) -> Self {
        self.done_caps = count;
        self
    }

    pub fn build(self) -> TrackerDocument {
        let mut doc = TrackerDocument::create(
            &self.template,
            player_names(self.players),
            &self.ruleset,
            self.started_at,
        )
        .unwrap();
        for (slot, pair) in self.pairs {
            doc.pairs_mut(slot).push(pair);
        }
        for cap in doc.level_caps.iter_mut().take(self.done_caps) {
            cap.done = true;
        }
        doc
    }
}
