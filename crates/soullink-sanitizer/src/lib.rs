//! Soullink Tracker Sanitizer
//!
//! The single admission point for tracker documents that originate outside
//! the current process (remote snapshots, push notifications, files on disk).
//!
//! [`coerce`] is total: any JSON value, including `null`, wrong types,
//! missing or extra keys, is repaired into a structurally valid
//! [`TrackerDocument`]. Missing or mistyped fields take the value of the
//! last-known-good `fallback` document. Repairs are a normal outcome, not an
//! error, and are only traced at `debug` level.
//!
//! Coercion is idempotent: coercing the serialized output of a coercion
//! against the same fallback returns the same document.
//!
//! # Example
//!
//! ```rust,ignore
//! use soullink_sanitizer::coerce;
//!
//! let doc = coerce(&serde_json::json!({ "players": ["Ash", 7] }), &last_known_good);
//! assert_eq!(doc.players.len(), 2);
//! ```

#![warn(unreachable_pub)]

mod coerce;
mod scalar;

use serde_json::Value;
use soullink_model::TrackerDocument;

/// Summary of the repairs made during one coercion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoerceReport {
    /// Paths of fields that were replaced by fallback or default values
    pub repairs: Vec<String>,
}

impl CoerceReport {
    /// Check if the input was already valid
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }

    /// Number of repaired fields
    #[inline]
    #[must_use]
    pub fn repair_count(&self) -> usize {
        self.repairs.len()
    }
}

/// Repair `raw` into a valid document, filling gaps from `fallback`
#[must_use]
pub fn coerce(raw: &Value, fallback: &TrackerDocument) -> TrackerDocument {
    coerce_with_report(raw, fallback).0
}

/// Repair `raw` and report which fields were repaired
#[must_use]
pub fn coerce_with_report(raw: &Value, fallback: &TrackerDocument) -> (TrackerDocument, CoerceReport) {
    let mut coercer = coerce::Coercer::new(fallback);
    let doc = coercer.document(raw);
    let report = coercer.finish();

    if !report.is_clean() {
        tracing::debug!(
            repairs = report.repair_count(),
            first = report.repairs.first().map(String::as_str),
            "repaired malformed tracker document"
        );
    }

    (doc, report)
}

/// Parse and repair a JSON string; unparsable text is treated as `null`
#[must_use]
pub fn coerce_str(raw: &str, fallback: &TrackerDocument) -> TrackerDocument {
    let value = serde_json::from_str(raw).unwrap_or(Value::Null);
    coerce(&value, fallback)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use soullink_model::{LinkedPair, Member, TEAM_CAPACITY};
    use soullink_test_utils::{fixture_document, two_player_document};

    #[test]
    fn valid_document_is_unchanged() {
        let doc = fixture_document();
        let raw = serde_json::to_value(&doc).unwrap();

        let (coerced, report) = coerce_with_report(&raw, &doc);
        assert_eq!(coerced, doc);
        assert!(report.is_clean(), "{:?}", report.repairs);
    }

    #[test]
    fn non_object_falls_back() {
        let fallback = two_player_document();
        for raw in [Value::Null, json!(3), json!("doc"), json!([1, 2])] {
            assert_eq!(coerce(&raw, &fallback), fallback);
        }
    }

    #[test]
    fn missing_fields_take_fallback() {
        let fallback = fixture_document();
        let doc = coerce(&json!({ "rules": ["only this"] }), &fallback);

        assert_eq!(doc.rules, vec!["only this".to_string()]);
        assert_eq!(doc.players, fallback.players);
        assert_eq!(doc.team, fallback.team);
        assert_eq!(doc.stats, fallback.stats);
        assert_eq!(doc.level_caps, fallback.level_caps);
    }

    #[test]
    fn wrong_types_take_fallback() {
        let fallback = fixture_document();
        let raw = json!({
            "team": "not a list",
            "rulesetId": 12,
            "runStartedAt": "yesterday",
            "hardcoreModeEnabled": "yes",
            "stats": { "runs": "many", "best": -3, "legendaryEncounters": 2 }
        });

        let doc = coerce(&raw, &fallback);
        assert_eq!(doc.team, fallback.team);
        assert_eq!(doc.ruleset_id, fallback.ruleset_id);
        assert_eq!(doc.run_started_at, fallback.run_started_at);
        assert!(doc.flags.hardcore_mode_enabled);
        assert_eq!(doc.stats.runs, fallback.stats.runs);
        assert_eq!(doc.stats.best, fallback.stats.best);
        assert_eq!(doc.stats.legendary_encounters, 2);
    }

    #[test]
    fn booleans_use_truthiness() {
        let fallback = two_player_document();
        let raw = json!({
            "hardcoreModeEnabled": 1,
            "rivalCensorEnabled": "yes",
            "legendaryTrackerEnabled": "false",
            "levelCaps": [{ "done": 1 }],
            "rivalCaps": [{ "revealed": "true", "done": [] }]
        });

        let (doc, report) = coerce_with_report(&raw, &fallback);
        assert!(doc.flags.hardcore_mode_enabled);
        assert!(doc.flags.rival_censor_enabled);
        assert!(doc.flags.legendary_tracker_enabled);
        assert!(doc.level_caps[0].done);
        assert!(doc.rival_caps[0].revealed);
        assert!(doc.rival_caps[0].done);
        assert!(report.repairs.iter().any(|r| r == "hardcoreModeEnabled"));
    }

    #[test]
    fn falsy_values_override_fallback() {
        let mut fallback = two_player_document();
        fallback.flags.hardcore_mode_enabled = true;
        fallback.flags.rival_censor_enabled = true;
        fallback.flags.legendary_tracker_enabled = true;
        fallback.level_caps[0].done = true;

        let raw = json!({
            "hardcoreModeEnabled": 0,
            "rivalCensorEnabled": "",
            "legendaryTrackerEnabled": null,
            "levelCaps": [{ "done": 0 }]
        });

        let doc = coerce(&raw, &fallback);
        assert!(!doc.flags.hardcore_mode_enabled);
        assert!(!doc.flags.rival_censor_enabled);
        assert!(!doc.flags.legendary_tracker_enabled);
        assert!(!doc.level_caps[0].done);
    }

    #[test]
    fn absent_booleans_take_fallback() {
        let mut fallback = two_player_document();
        fallback.flags.rival_censor_enabled = true;

        let doc = coerce(&json!({ "levelCaps": [{}] }), &fallback);
        assert!(doc.flags.rival_censor_enabled);
        assert_eq!(doc.level_caps[0].done, fallback.level_caps[0].done);
    }

    #[test]
    fn per_player_arrays_are_resized() {
        let fallback = two_player_document();
        let raw = json!({
            "stats": { "deaths": [4], "sumDeaths": [1, 2, 3, 4], "top4Items": [1, "x"] }
        });

        let doc = coerce(&raw, &fallback);
        assert_eq!(doc.stats.deaths, vec![4, 0]);
        assert_eq!(doc.stats.sum_deaths, vec![1, 2]);
        assert_eq!(doc.stats.top4_items, vec![1, fallback.stats.top4_items[1]]);
    }

    #[test]
    fn unrecognized_pairs_become_holes_in_place() {
        let fallback = two_player_document();
        let raw = json!({
            "box": [
                { "id": 5, "route": "Route 1", "members": [{ "name": "Pidgey", "nickname": "A" }] },
                42,
                { "id": 5, "route": "Route 2", "members": [] }
            ]
        });

        let doc = coerce(&raw, &fallback);
        assert_eq!(doc.boxed.len(), 3);
        assert_eq!(doc.boxed[0].id, 5);
        assert_eq!(doc.boxed[0].members[0], Member::new("Pidgey", "A"));
        assert_eq!(doc.boxed[0].members.len(), 2);
        assert!(doc.boxed[1].is_hole());
        assert_eq!(doc.boxed[1].id, 6);
        assert_eq!(doc.boxed[2].id, 7);
        assert_eq!(doc.boxed[2].route, "Route 2");
        assert!(doc.validate().is_empty());
    }

    #[test]
    fn milestones_take_identity_from_fallback_index() {
        let fallback = fixture_document();
        let raw = json!({
            "levelCaps": [ { "done": true }, "junk", { "id": 3, "label": "Custom", "level": 30, "done": false } ]
        });

        let doc = coerce(&raw, &fallback);
        assert_eq!(doc.level_caps.len(), 3);
        assert_eq!(doc.level_caps[0].id, fallback.level_caps[0].id);
        assert_eq!(doc.level_caps[0].label, fallback.level_caps[0].label);
        assert!(doc.level_caps[0].done);
        assert_eq!(doc.level_caps[1], fallback.level_caps[1]);
        assert_eq!(doc.level_caps[2].label, "Custom");
        assert_eq!(doc.level_caps[2].level, "30");
    }

    #[test]
    fn milestones_beyond_fallback_get_defaults() {
        let fallback = two_player_document();
        let extra = fallback.level_caps.len();
        let mut caps: Vec<Value> = fallback
            .level_caps
            .iter()
            .map(|m| serde_json::to_value(m).unwrap())
            .collect();
        caps.push(json!({}));

        let doc = coerce(&json!({ "levelCaps": caps }), &fallback);
        let last = &doc.level_caps[extra];
        assert_eq!(last.id as usize, extra + 1);
        assert!(last.label.is_empty());
        assert!(!last.done);
    }

    #[test]
    fn team_overflow_moves_to_box() {
        let fallback = two_player_document();
        let team: Vec<LinkedPair> = (1..=8)
            .map(|id| LinkedPair::new(id, format!("Route {id}"), vec![Member::default(); 2]))
            .collect();
        let raw = json!({ "team": team, "box": [] });

        let doc = coerce(&raw, &fallback);
        assert_eq!(doc.team.len(), TEAM_CAPACITY);
        assert_eq!(doc.boxed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![7, 8]);
    }

    #[test]
    fn coerce_str_handles_garbage() {
        let fallback = two_player_document();
        assert_eq!(coerce_str("{not json", &fallback), fallback);
        let doc = coerce_str(r#"{"players":["A","B"],"rules":[]}"#, &fallback);
        assert!(doc.rules.is_empty());
    }

    #[test]
    fn coerce_is_idempotent_on_messy_input() {
        let fallback = fixture_document();
        let raw = json!({
            "players": ["A", null, "C"],
            "team": [null, { "id": "x" }, { "id": 2.5, "members": [1, { "name": "Geodude" }] }],
            "graveyard": [{ "id": 2 }],
            "levelCaps": [1, { "label": 4 }],
            "rivalCaps": [{ "revealed": 1 }],
            "stats": { "deaths": [1.9, -1] }
        });

        let once = coerce(&raw, &fallback);
        let twice = coerce(&serde_json::to_value(&once).unwrap(), &fallback);
        assert_eq!(once, twice);
        assert!(once.validate().is_empty());
    }
}
