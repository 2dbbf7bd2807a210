//! Run resets

use serde::{Deserialize, Serialize};
use soullink_model::{Flags, Milestone, RivalMilestone, Ruleset, Stats, TrackerDocument};
use std::fmt;
use std::str::FromStr;

/// How much of the run to reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResetMode {
    /// Fresh document: counters, rules and flags back to defaults
    Full,
    /// Start the next attempt; keeps rules, flags, best and legendary count
    Current,
    /// Only zero the legendary encounter counter
    LegendaryOnly,
}

impl ResetMode {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Current => "current",
            Self::LegendaryOnly => "legendaryOnly",
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "full" => Ok(Self::Full),
            "current" => Ok(Self::Current),
            "legendaryonly" | "legendary" => Ok(Self::LegendaryOnly),
            _ => Err(format!(
                "invalid reset mode '{s}' (expected full, current or legendaryOnly)"
            )),
        }
    }
}

/// Reset the run
///
/// `now_ms` becomes the new `runStartedAt` for [`ResetMode::Full`] and
/// [`ResetMode::Current`].
#[must_use]
pub fn reset_run(doc: &TrackerDocument, mode: ResetMode, now_ms: i64) -> TrackerDocument {
    let next = match mode {
        ResetMode::Full => reset_full(doc, now_ms),
        ResetMode::Current => reset_current(doc, now_ms),
        ResetMode::LegendaryOnly => {
            let mut next = doc.clone();
            next.stats.legendary_encounters = 0;
            next
        }
    };
    tracing::debug!(mode = %mode, runs = next.stats.runs, "run reset");
    next
}

fn reset_full(doc: &TrackerDocument, now_ms: i64) -> TrackerDocument {
    let rules = Ruleset::find(&doc.ruleset_id)
        .map(|r| r.rules)
        .unwrap_or_default();

    TrackerDocument {
        players: doc.players.clone(),
        team: Vec::new(),
        boxed: Vec::new(),
        graveyard: Vec::new(),
        rules,
        ruleset_id: doc.ruleset_id.clone(),
        level_caps: doc.level_caps.iter().map(Milestone::cleared).collect(),
        rival_caps: doc.rival_caps.iter().map(RivalMilestone::cleared).collect(),
        stats: Stats::fresh(doc.player_count()),
        flags: Flags::default(),
        run_started_at: now_ms,
    }
}

fn reset_current(doc: &TrackerDocument, now_ms: i64) -> TrackerDocument {
    let mut next = doc.clone();
    next.team.clear();
    next.boxed.clear();
    next.graveyard.clear();
    next.level_caps = doc.level_caps.iter().map(Milestone::cleared).collect();
    next.rival_caps = doc.rival_caps.iter().map(RivalMilestone::cleared).collect();

    let stats = &mut next.stats;
    stats.runs = stats.runs.saturating_add(1);
    for (sum, deaths) in stats.sum_deaths.iter_mut().zip(stats.deaths.iter_mut()) {
        *sum = sum.saturating_add(*deaths);
        *deaths = 0;
    }
    stats.top4_items.iter_mut().for_each(|items| *items = 0);
    next.run_started_at = now_ms;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestones::toggle_level_cap;
    use pretty_assertions::assert_eq;
    use soullink_model::Slot;
    use soullink_test_utils::{fixture_document, DocumentBuilder};

    #[test]
    fn current_carries_deaths_over() {
        let mut doc = DocumentBuilder::new().build();
        doc.stats.deaths = vec![3, 1];
        doc.stats.top4_items = vec![2, 2];
        doc.stats.legendary_encounters = 4;
        doc.stats.best = 3;
        doc.rules.push("House rule".to_string());
        doc.flags.hardcore_mode_enabled = true;
        let doc = toggle_level_cap(&doc, 0).unwrap();

        let next = reset_run(&doc, ResetMode::Current, 99);
        assert_eq!(next.stats.sum_deaths, vec![3, 1]);
        assert_eq!(next.stats.deaths, vec![0, 0]);
        assert_eq!(next.stats.top4_items, vec![0, 0]);
        assert_eq!(next.stats.runs, 2);
        assert_eq!(next.stats.best, 3);
        assert_eq!(next.stats.legendary_encounters, 4);
        assert_eq!(next.rules, doc.rules);
        assert_eq!(next.flags, doc.flags);
        assert_eq!(next.run_started_at, 99);
        assert!(next.same_milestone_identity(&doc));
        assert!(next.level_caps.iter().all(|m| !m.done));
    }

    #[test]
    fn current_clears_roster() {
        let doc = fixture_document();
        let next = reset_run(&doc, ResetMode::Current, 0);
        assert!(next.pairs(Slot::Team).is_empty());
        assert!(next.pairs(Slot::Graveyard).is_empty());
        assert_eq!(next.players, doc.players);
    }

    #[test]
    fn full_starts_over() {
        let mut doc = fixture_document();
        doc.stats.runs = 7;
        doc.stats.best = 6;
        doc.rules = vec!["edited".to_string()];
        doc.flags.rival_censor_enabled = true;

        let next = reset_run(&doc, ResetMode::Full, 123);
        assert_eq!(next.stats, Stats::fresh(2));
        assert_eq!(next.rules, Ruleset::find("standard").unwrap().rules);
        assert_eq!(next.flags, Flags::default());
        assert_eq!(next.run_started_at, 123);
        assert!(next.same_milestone_identity(&doc));
        assert_eq!(next.next_pair_id(), 1);
    }

    #[test]
    fn full_with_unknown_ruleset_has_no_rules() {
        let mut doc = fixture_document();
        doc.ruleset_id = "gone".to_string();
        assert!(reset_run(&doc, ResetMode::Full, 0).rules.is_empty());
    }

    #[test]
    fn legendary_only() {
        let mut doc = fixture_document();
        doc.stats.legendary_encounters = 9;
        let next = reset_run(&doc, ResetMode::LegendaryOnly, 5);

        let mut expected = doc.clone();
        expected.stats.legendary_encounters = 0;
        assert_eq!(next, expected);
    }

    #[test]
    fn parse_mode() {
        assert_eq!("legendaryOnly".parse::<ResetMode>(), Ok(ResetMode::LegendaryOnly));
        assert_eq!("legendary-only".parse::<ResetMode>(), Ok(ResetMode::LegendaryOnly));
        assert_eq!("Full".parse::<ResetMode>(), Ok(ResetMode::Full));
        assert!("partial".parse::<ResetMode>().is_err());
    }
}
