//! Field-by-field repair of untrusted tracker documents

use crate::scalar::{
    as_count, as_count_u64, as_display, as_timestamp, field, str_field, truthy, MAX_PAIR_ID,
};
use crate::CoerceReport;
use serde_json::{Map, Value};
use soullink_model::{
    resize_per_player, Flags, LinkedPair, Member, Milestone, PairId, RivalMilestone, Stats,
    TrackerDocument, MAX_PLAYERS, TEAM_CAPACITY,
};
use std::collections::HashSet;

type Object = Map<String, Value>;

/// Pair before id assignment
struct PendingPair {
    id: Option<PairId>,
    pair: LinkedPair,
}

/// Single-use coercion pass against one fallback document
pub(crate) struct Coercer<'a> {
    fallback: &'a TrackerDocument,
    report: CoerceReport,
}

impl<'a> Coercer<'a> {
    pub(crate) fn new(fallback: &'a TrackerDocument) -> Self {
        Self {
            fallback,
            report: CoerceReport::default(),
        }
    }

    pub(crate) fn finish(self) -> CoerceReport {
        self.report
    }

    fn repair(&mut self, field: impl Into<String>) {
        self.report.repairs.push(field.into());
    }

    fn or_fallback<T>(&mut self, field: &str, value: Option<T>, fallback: impl FnOnce() -> T) -> T {
        if let Some(value) = value {
            value
        } else {
            self.repair(field);
            fallback()
        }
    }

    /// Boolean field: fallback only when absent, truthiness for non-booleans
    fn boolean(&mut self, field: &str, value: Option<&Value>, fallback: impl FnOnce() -> bool) -> bool {
        match value {
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.repair(field);
                truthy(other)
            }
            None => {
                self.repair(field);
                fallback()
            }
        }
    }

    pub(crate) fn document(&mut self, raw: &Value) -> TrackerDocument {
        let fb = self.fallback;
        let Some(obj) = raw.as_object() else {
            self.repair("document");
            let mut doc = fb.clone();
            self.normalize(&mut doc);
            return doc;
        };

        let players = self.players(obj.get("players"));
        let n = players.len();

        let mut team = self.pairs("team", obj.get("team"), &fb.team, n);
        let mut boxed = self.pairs("box", obj.get("box"), &fb.boxed, n);
        let mut graveyard = self.pairs("graveyard", obj.get("graveyard"), &fb.graveyard, n);

        if team.len() > TEAM_CAPACITY {
            self.repair("team.capacity");
            let overflow = team.split_off(TEAM_CAPACITY);
            boxed.splice(0..0, overflow);
        }
        self.assign_pair_ids([&mut team, &mut boxed, &mut graveyard]);

        let rules = self.rules(obj.get("rules"));
        let ruleset_id = self.or_fallback(
            "rulesetId",
            obj.get("rulesetId").and_then(Value::as_str).map(str::to_string),
            || fb.ruleset_id.clone(),
        );
        let level_caps = self.level_caps(obj.get("levelCaps"));
        let rival_caps = self.rival_caps(obj.get("rivalCaps"));
        let stats = self.stats(obj.get("stats"), n);
        let flags = self.flags(obj);
        let run_started_at = self.or_fallback(
            "runStartedAt",
            obj.get("runStartedAt").and_then(as_timestamp),
            || fb.run_started_at,
        );

        TrackerDocument {
            players,
            team: team.into_iter().map(|p| p.pair).collect(),
            boxed: boxed.into_iter().map(|p| p.pair).collect(),
            graveyard: graveyard.into_iter().map(|p| p.pair).collect(),
            rules,
            ruleset_id,
            level_caps,
            rival_caps,
            stats,
            flags,
            run_started_at,
        }
    }

    /// Bring a fallback clone in line with structural invariants
    fn normalize(&mut self, doc: &mut TrackerDocument) {
        if doc.players.is_empty() {
            doc.players.push("Player 1".to_string());
        }
        doc.players.truncate(MAX_PLAYERS);
        let n = doc.players.len();
        doc.stats.resize(n);
        for pair in doc
            .team
            .iter_mut()
            .chain(doc.boxed.iter_mut())
            .chain(doc.graveyard.iter_mut())
        {
            pair.resize_members(n);
        }
        if doc.team.len() > TEAM_CAPACITY {
            let overflow = doc.team.split_off(TEAM_CAPACITY);
            doc.boxed.splice(0..0, overflow);
        }

        let wrap = |pairs: &mut Vec<LinkedPair>| -> Vec<PendingPair> {
            pairs
                .drain(..)
                .map(|pair| PendingPair {
                    id: (pair.id <= MAX_PAIR_ID).then_some(pair.id),
                    pair,
                })
                .collect()
        };
        let mut team = wrap(&mut doc.team);
        let mut boxed = wrap(&mut doc.boxed);
        let mut graveyard = wrap(&mut doc.graveyard);
        self.assign_pair_ids([&mut team, &mut boxed, &mut graveyard]);
        doc.team = team.into_iter().map(|p| p.pair).collect();
        doc.boxed = boxed.into_iter().map(|p| p.pair).collect();
        doc.graveyard = graveyard.into_iter().map(|p| p.pair).collect();
    }

    fn players(&mut self, raw: Option<&Value>) -> Vec<String> {
        let fallback: &TrackerDocument = self.fallback;
        let fb = &fallback.players;
        match raw.and_then(Value::as_array) {
            Some(items) if (1..=MAX_PLAYERS).contains(&items.len()) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item.as_str() {
                    Some(name) => name.to_string(),
                    None => {
                        self.repair(format!("players[{i}]"));
                        fb.get(i).cloned().unwrap_or_else(|| format!("Player {}", i + 1))
                    }
                })
                .collect(),
            _ => {
                self.repair("players");
                let mut players: Vec<String> = fb.iter().take(MAX_PLAYERS).cloned().collect();
                if players.is_empty() {
                    players.push("Player 1".to_string());
                }
                players
            }
        }
    }

    fn pairs(
        &mut self,
        name: &str,
        raw: Option<&Value>,
        fallback: &[LinkedPair],
        players: usize,
    ) -> Vec<PendingPair> {
        let Some(items) = raw.and_then(Value::as_array) else {
            self.repair(name);
            return fallback
                .iter()
                .map(|pair| {
                    let mut pair = pair.clone();
                    pair.resize_members(players);
                    PendingPair {
                        id: (pair.id <= MAX_PAIR_ID).then_some(pair.id),
                        pair,
                    }
                })
                .collect();
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.pair(&format!("{name}[{i}]"), item, players))
            .collect()
    }

    fn pair(&mut self, path: &str, raw: &Value, players: usize) -> PendingPair {
        let Some(obj) = raw.as_object() else {
            self.repair(path);
            return PendingPair {
                id: None,
                pair: LinkedPair::empty(0, players),
            };
        };

        let id = obj
            .get("id")
            .and_then(as_count_u64)
            .filter(|id| *id <= MAX_PAIR_ID);
        let route = self.or_fallback(&format!("{path}.route"), str_field(Some(obj), "route"), String::new);

        let mut members: Vec<Member> = match obj.get("members").and_then(Value::as_array) {
            Some(items) => items.iter().map(member).collect(),
            None => {
                self.repair(format!("{path}.members"));
                Vec::new()
            }
        };
        members.resize_with(players, Member::default);

        PendingPair {
            id,
            pair: LinkedPair::new(id.unwrap_or(0), route, members),
        }
    }

    /// Give every pair a unique id; repaired ids follow the current maximum
    fn assign_pair_ids(&mut self, slots: [&mut Vec<PendingPair>; 3]) {
        let mut used = HashSet::new();
        let mut max = 0;
        let mut needs_id = Vec::new();

        for (slot, pairs) in slots.into_iter().enumerate() {
            for (idx, pending) in pairs.into_iter().enumerate() {
                match pending.id {
                    Some(id) if used.insert(id) => {
                        max = max.max(id);
                        pending.pair.id = id;
                    }
                    _ => needs_id.push((slot, idx, &mut pending.pair)),
                }
            }
        }

        for (slot, idx, pair) in needs_id {
            let id = if max < MAX_PAIR_ID {
                max + 1
            } else {
                (1..).find(|id| !used.contains(id)).unwrap_or(0)
            };
            used.insert(id);
            max = max.max(id);
            pair.id = id;
            self.repair(format!("pairs[{slot}][{idx}].id"));
        }
    }

    fn rules(&mut self, raw: Option<&Value>) -> Vec<String> {
        match raw.and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let rule = item.as_str().map(str::to_string);
                    self.or_fallback(&format!("rules[{i}]"), rule, String::new)
                })
                .collect(),
            None => {
                self.repair("rules");
                self.fallback.rules.clone()
            }
        }
    }

    fn level_caps(&mut self, raw: Option<&Value>) -> Vec<Milestone> {
        let fallback: &TrackerDocument = self.fallback;
        let fb = &fallback.level_caps;
        let Some(items) = raw.and_then(Value::as_array) else {
            self.repair("levelCaps");
            return fb.clone();
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let obj = item.as_object();
                let base = fb.get(i);
                let path = format!("levelCaps[{i}]");
                Milestone {
                    id: self.or_fallback(&path, field(obj, "id").and_then(as_count), || {
                        base.map_or_else(|| ordinal(i), |b| b.id)
                    }),
                    label: self.or_fallback(&path, str_field(obj, "label"), || {
                        base.map(|b| b.label.clone()).unwrap_or_default()
                    }),
                    level: self.or_fallback(&path, field(obj, "level").and_then(as_display), || {
                        base.map(|b| b.level.clone()).unwrap_or_default()
                    }),
                    done: self.boolean(&path, field(obj, "done"), || {
                        base.is_some_and(|b| b.done)
                    }),
                }
            })
            .collect()
    }

    fn rival_caps(&mut self, raw: Option<&Value>) -> Vec<RivalMilestone> {
        let fallback: &TrackerDocument = self.fallback;
        let fb = &fallback.rival_caps;
        let Some(items) = raw.and_then(Value::as_array) else {
            self.repair("rivalCaps");
            return fb.clone();
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let obj = item.as_object();
                let base = fb.get(i);
                let path = format!("rivalCaps[{i}]");
                RivalMilestone {
                    id: self.or_fallback(&path, field(obj, "id").and_then(as_count), || {
                        base.map_or_else(|| ordinal(i), |b| b.id)
                    }),
                    label: self.or_fallback(&path, str_field(obj, "label"), || {
                        base.map(|b| b.label.clone()).unwrap_or_default()
                    }),
                    level: self.or_fallback(&path, field(obj, "level").and_then(as_display), || {
                        base.map(|b| b.level.clone()).unwrap_or_default()
                    }),
                    done: self.boolean(&path, field(obj, "done"), || {
                        base.is_some_and(|b| b.done)
                    }),
                    revealed: self.boolean(&path, field(obj, "revealed"), || {
                        base.is_some_and(|b| b.revealed)
                    }),
                }
            })
            .collect()
    }

    fn stats(&mut self, raw: Option<&Value>, players: usize) -> Stats {
        let fallback: &TrackerDocument = self.fallback;
        let fb = &fallback.stats;
        let Some(obj) = raw.and_then(Value::as_object) else {
            self.repair("stats");
            let mut stats = fb.clone();
            stats.resize(players);
            return stats;
        };

        let count = |key: &str| obj.get(key).and_then(as_count);
        Stats {
            runs: self.or_fallback("stats.runs", count("runs"), || fb.runs),
            best: self.or_fallback("stats.best", count("best"), || fb.best),
            top4_items: self.per_player("stats.top4Items", obj.get("top4Items"), &fb.top4_items, players),
            deaths: self.per_player("stats.deaths", obj.get("deaths"), &fb.deaths, players),
            sum_deaths: self.per_player("stats.sumDeaths", obj.get("sumDeaths"), &fb.sum_deaths, players),
            legendary_encounters: self.or_fallback(
                "stats.legendaryEncounters",
                count("legendaryEncounters"),
                || fb.legendary_encounters,
            ),
        }
    }

    fn per_player(
        &mut self,
        path: &str,
        raw: Option<&Value>,
        fallback: &[u32],
        players: usize,
    ) -> Vec<u32> {
        let mut values: Vec<u32> = match raw.and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .take(players)
                .enumerate()
                .map(|(i, item)| {
                    self.or_fallback(&format!("{path}[{i}]"), as_count(item), || {
                        fallback.get(i).copied().unwrap_or(0)
                    })
                })
                .collect(),
            None => {
                self.repair(path);
                fallback.to_vec()
            }
        };
        resize_per_player(&mut values, players);
        values
    }

    fn flags(&mut self, obj: &Object) -> Flags {
        let fb = self.fallback.flags;
        let obj = Some(obj);
        Flags {
            legendary_tracker_enabled: self.boolean(
                "legendaryTrackerEnabled",
                field(obj, "legendaryTrackerEnabled"),
                || fb.legendary_tracker_enabled,
            ),
            rival_censor_enabled: self.boolean(
                "rivalCensorEnabled",
                field(obj, "rivalCensorEnabled"),
                || fb.rival_censor_enabled,
            ),
            hardcore_mode_enabled: self.boolean(
                "hardcoreModeEnabled",
                field(obj, "hardcoreModeEnabled"),
                || fb.hardcore_mode_enabled,
            ),
        }
    }
}

fn member(raw: &Value) -> Member {
    let obj = raw.as_object();
    Member {
        name: str_field(obj, "name").unwrap_or_default(),
        nickname: str_field(obj, "nickname").unwrap_or_default(),
    }
}

fn ordinal(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
