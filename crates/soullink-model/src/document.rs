//! The replicated tracker document
//!
//! One [`TrackerDocument`] describes one challenge run. It is created once
//! from a game template, chosen player names and a ruleset, and afterwards
//! only mutated in place.

use crate::error::ModelError;
use crate::milestone::{Milestone, Progress, RivalMilestone};
use crate::pair::{LinkedPair, PairId, Slot};
use crate::ruleset::Ruleset;
use crate::template::GameTemplate;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum number of players
pub const MIN_PLAYERS: usize = 1;

/// Maximum number of players
pub const MAX_PLAYERS: usize = 3;

/// Maximum number of pairs in the team
pub const TEAM_CAPACITY: usize = 6;

/// Number of leading level caps that count as badges
pub const BADGE_COUNT: usize = 8;

/// First milestone id past the badges (Top 4, Champion)
pub const FIRST_POST_BADGE_ID: u32 = 9;

/// Run statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Run counter, starts at 1
    pub runs: u32,
    /// Most badges ever completed (never decreases)
    pub best: u32,
    /// Top 4 items per player
    pub top4_items: Vec<u32>,
    /// Deaths in the current run per player
    pub deaths: Vec<u32>,
    /// Deaths over all previous runs per player
    pub sum_deaths: Vec<u32>,
    /// Legendary encounters counter
    pub legendary_encounters: u32,
}

impl Stats {
    /// Statistics of a fresh document
    #[must_use]
    pub fn fresh(players: usize) -> Self {
        Self {
            runs: 1,
            best: 0,
            top4_items: vec![0; players],
            deaths: vec![0; players],
            sum_deaths: vec![0; players],
            legendary_encounters: 0,
        }
    }

    /// Resize every per-player array to `players` entries
    pub fn resize(&mut self, players: usize) {
        resize_per_player(&mut self.top4_items, players);
        resize_per_player(&mut self.deaths, players);
        resize_per_player(&mut self.sum_deaths, players);
    }
}

/// Zero-pad or truncate a per-player array, preserving index alignment
pub fn resize_per_player(values: &mut Vec<u32>, players: usize) {
    values.resize(players, 0);
}

/// Pass-through boolean toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flags {
    /// Show legendary encounter counter
    pub legendary_tracker_enabled: bool,
    /// Hide rivals until revealed
    pub rival_censor_enabled: bool,
    /// Hardcore mode
    pub hardcore_mode_enabled: bool,
}

/// Flag selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `legendaryTrackerEnabled`
    LegendaryTracker,
    /// `rivalCensorEnabled`
    RivalCensor,
    /// `hardcoreModeEnabled`
    HardcoreMode,
}

impl Flags {
    /// Read flag
    #[inline]
    #[must_use]
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::LegendaryTracker => self.legendary_tracker_enabled,
            Flag::RivalCensor => self.rival_censor_enabled,
            Flag::HardcoreMode => self.hardcore_mode_enabled,
        }
    }

    /// Write flag
    #[inline]
    pub fn set(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::LegendaryTracker => self.legendary_tracker_enabled = value,
            Flag::RivalCensor => self.rival_censor_enabled = value,
            Flag::HardcoreMode => self.hardcore_mode_enabled = value,
        }
    }
}

/// The replicated tracker aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerDocument {
    /// Player names; index identifies a player everywhere in the document
    pub players: Vec<String>,
    /// Active party, at most [`TEAM_CAPACITY`] pairs
    pub team: Vec<LinkedPair>,
    /// Stored pairs
    #[serde(rename = "box")]
    pub boxed: Vec<LinkedPair>,
    /// Lost pairs
    pub graveyard: Vec<LinkedPair>,
    /// Free-text rules
    pub rules: Vec<String>,
    /// Reference to the external ruleset
    pub ruleset_id: String,
    /// Level cap milestones
    pub level_caps: Vec<Milestone>,
    /// Rival milestones
    pub rival_caps: Vec<RivalMilestone>,
    /// Run statistics
    pub stats: Stats,
    /// Boolean toggles
    #[serde(flatten)]
    pub flags: Flags,
    /// Start of the current run (Unix milliseconds)
    pub run_started_at: i64,
}

/// Structural invariant violated by a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Player count outside `1..=3`
    PlayerCount(usize),
    /// Per-player array length differs from player count
    StatLength {
        /// Field name
        field: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
    /// Team holds more than [`TEAM_CAPACITY`] pairs
    TeamOverCapacity(usize),
    /// Pair id used more than once
    DuplicatePairId(PairId),
    /// Pair member count differs from player count
    MemberCount {
        /// Pair id
        pair: PairId,
        /// Actual member count
        actual: usize,
    },
}

impl TrackerDocument {
    /// Create a fresh document
    ///
    /// # Errors
    /// - `ModelError::InvalidPlayerCount` if `players` is empty or longer than 3
    pub fn create(
        template: &GameTemplate,
        players: Vec<String>,
        ruleset: &Ruleset,
        started_at_ms: i64,
    ) -> Result<Self, ModelError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(ModelError::InvalidPlayerCount(players.len()));
        }

        let count = players.len();
        Ok(Self {
            players,
            team: Vec::new(),
            boxed: Vec::new(),
            graveyard: Vec::new(),
            rules: ruleset.rules.clone(),
            ruleset_id: ruleset.id.clone(),
            level_caps: template.level_caps.iter().map(Milestone::cleared).collect(),
            rival_caps: template.rival_caps.iter().map(RivalMilestone::cleared).collect(),
            stats: Stats::fresh(count),
            flags: Flags::default(),
            run_started_at: started_at_ms,
        })
    }

    /// Number of players
    #[inline]
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Start of current run as a timestamp
    #[must_use]
    pub fn run_started(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.run_started_at).single()
    }

    /// Pairs in slot
    #[inline]
    #[must_use]
    pub fn pairs(&self, slot: Slot) -> &[LinkedPair] {
        match slot {
            Slot::Team => &self.team,
            Slot::Box => &self.boxed,
            Slot::Graveyard => &self.graveyard,
        }
    }

    /// Mutable pairs in slot
    #[inline]
    pub fn pairs_mut(&mut self, slot: Slot) -> &mut Vec<LinkedPair> {
        match slot {
            Slot::Team => &mut self.team,
            Slot::Box => &mut self.boxed,
            Slot::Graveyard => &mut self.graveyard,
        }
    }

    /// Locate pair by id
    #[must_use]
    pub fn find_pair(&self, id: PairId) -> Option<(Slot, usize)> {
        Slot::ALL.into_iter().find_map(|slot| {
            self.pairs(slot)
                .iter()
                .position(|p| p.id == id)
                .map(|idx| (slot, idx))
        })
    }

    /// Get pair by id
    #[must_use]
    pub fn pair(&self, id: PairId) -> Option<&LinkedPair> {
        self.find_pair(id).map(|(slot, idx)| &self.pairs(slot)[idx])
    }

    /// Next unused pair id (creation order)
    #[must_use]
    pub fn next_pair_id(&self) -> PairId {
        self.all_pairs().map(|p| p.id).max().map_or(1, |max| max.saturating_add(1))
    }

    /// Iterate over every pair in team, box and graveyard order
    pub fn all_pairs(&self) -> impl Iterator<Item = &LinkedPair> {
        self.team
            .iter()
            .chain(self.boxed.iter())
            .chain(self.graveyard.iter())
    }

    /// Team pairs that are not holes
    pub fn filled_team(&self) -> impl Iterator<Item = &LinkedPair> {
        self.team.iter().filter(|p| !p.is_hole())
    }

    /// Check if team is at capacity
    #[inline]
    #[must_use]
    pub fn team_is_full(&self) -> bool {
        self.team.len() >= TEAM_CAPACITY
    }

    /// Compare milestone identity (ids, labels, levels) with another document
    #[must_use]
    pub fn same_milestone_identity(&self, other: &Self) -> bool {
        self.level_caps.len() == other.level_caps.len()
            && self.rival_caps.len() == other.rival_caps.len()
            && self
                .level_caps
                .iter()
                .zip(&other.level_caps)
                .all(|(a, b)| a.same_identity(b))
            && self
                .rival_caps
                .iter()
                .zip(&other.rival_caps)
                .all(|(a, b)| a.same_identity(b))
    }

    /// Collect structural invariant violations (empty when valid)
    #[must_use]
    pub fn validate(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let n = self.player_count();

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
            violations.push(InvariantViolation::PlayerCount(n));
        }

        for (field, values) in [
            ("top4Items", &self.stats.top4_items),
            ("deaths", &self.stats.deaths),
            ("sumDeaths", &self.stats.sum_deaths),
        ] {
            if values.len() != n {
                violations.push(InvariantViolation::StatLength {
                    field,
                    expected: n,
                    actual: values.len(),
                });
            }
        }

        if self.team.len() > TEAM_CAPACITY {
            violations.push(InvariantViolation::TeamOverCapacity(self.team.len()));
        }

        let mut seen = HashSet::new();
        for pair in self.all_pairs() {
            if !seen.insert(pair.id) {
                violations.push(InvariantViolation::DuplicatePairId(pair.id));
            }
            if pair.members.len() != n {
                violations.push(InvariantViolation::MemberCount {
                    pair: pair.id,
                    actual: pair.members.len(),
                });
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::Member;
    use pretty_assertions::assert_eq;

    fn doc(players: usize) -> TrackerDocument {
        let template = GameTemplate::find("platinum").unwrap();
        let ruleset = Ruleset::find("standard").unwrap();
        let names = (0..players).map(|i| format!("P{i}")).collect();
        TrackerDocument::create(&template, names, &ruleset, 0).unwrap()
    }

    #[test]
    fn create_rejects_bad_player_counts() {
        let template = GameTemplate::find("platinum").unwrap();
        let ruleset = Ruleset::find("standard").unwrap();

        assert_eq!(
            TrackerDocument::create(&template, vec![], &ruleset, 0).unwrap_err(),
            ModelError::InvalidPlayerCount(0)
        );
        let four = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert!(TrackerDocument::create(&template, four, &ruleset, 0).is_err());
    }

    #[test]
    fn fresh_stats_match_players() {
        let d = doc(2);
        assert_eq!(d.stats, Stats::fresh(2));
        assert_eq!(d.stats.runs, 1);
        assert_eq!(d.stats.best, 0);
    }

    #[test]
    fn resize_per_player_pads_and_truncates() {
        let mut v = vec![3, 1];
        resize_per_player(&mut v, 3);
        assert_eq!(v, vec![3, 1, 0]);
        resize_per_player(&mut v, 1);
        assert_eq!(v, vec![3]);
    }

    #[test]
    fn next_pair_id_spans_all_slots() {
        let mut d = doc(1);
        assert_eq!(d.next_pair_id(), 1);

        d.team.push(LinkedPair::empty(4, 1));
        d.graveyard.push(LinkedPair::empty(9, 1));
        assert_eq!(d.next_pair_id(), 10);
        assert_eq!(d.find_pair(9), Some((Slot::Graveyard, 0)));
        assert_eq!(d.find_pair(5), None);
    }

    #[test]
    fn filled_team_skips_holes() {
        let mut d = doc(1);
        d.team.push(LinkedPair::empty(1, 1));
        d.team
            .push(LinkedPair::new(2, "Route 202", vec![Member::new("Shinx", "Sparky")]));

        let filled: Vec<_> = d.filled_team().map(|p| p.id).collect();
        assert_eq!(filled, vec![2]);
        assert_eq!(d.team.len(), 2);
    }

    #[test]
    fn validate_reports_violations() {
        let mut d = doc(2);
        d.stats.deaths.push(0);
        for id in 0..7 {
            d.team.push(LinkedPair::empty(id, 2));
        }
        d.boxed.push(LinkedPair::empty(0, 1));

        let violations = d.validate();
        assert!(violations.contains(&InvariantViolation::StatLength {
            field: "deaths",
            expected: 2,
            actual: 3
        }));
        assert!(violations.contains(&InvariantViolation::TeamOverCapacity(7)));
        assert!(violations.contains(&InvariantViolation::DuplicatePairId(0)));
        assert!(violations.contains(&InvariantViolation::MemberCount { pair: 0, actual: 1 }));
    }

    #[test]
    fn flags_get_set() {
        let mut flags = Flags::default();
        flags.set(Flag::RivalCensor, true);
        assert!(flags.get(Flag::RivalCensor));
        assert!(!flags.get(Flag::HardcoreMode));
    }

    #[test]
    fn run_started_converts_millis() {
        let mut d = doc(1);
        d.run_started_at = 1_700_000_000_000;
        assert_eq!(d.run_started().unwrap().timestamp(), 1_700_000_000);
    }
}
