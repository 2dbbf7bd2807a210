//! Player names, rule text, flags and counters

use crate::error::{ProgressionError, Result};
use soullink_model::{Flag, TrackerDocument};

/// Rename a player; the player count never changes
///
/// # Errors
/// - `PlayerOutOfRange` if `index` is not a player
/// - `EmptyName` if `name` is blank
pub fn rename_player(doc: &TrackerDocument, index: usize, name: &str) -> Result<TrackerDocument> {
    let players = doc.player_count();
    if index >= players {
        return Err(ProgressionError::PlayerOutOfRange { index, players });
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(ProgressionError::EmptyName);
    }

    let mut next = doc.clone();
    next.players[index] = name.to_string();
    Ok(next)
}

/// Append a rule
#[must_use]
pub fn add_rule(doc: &TrackerDocument, rule: impl Into<String>) -> TrackerDocument {
    let mut next = doc.clone();
    next.rules.push(rule.into());
    next
}

fn rule_index(doc: &TrackerDocument, index: usize) -> Result<()> {
    let len = doc.rules.len();
    if index < len {
        Ok(())
    } else {
        Err(ProgressionError::OutOfRange {
            what: "rule",
            index,
            len,
        })
    }
}

/// Replace the rule at `index`
///
/// # Errors
/// - `OutOfRange` if there is no rule at `index`
pub fn update_rule(
    doc: &TrackerDocument,
    index: usize,
    rule: impl Into<String>,
) -> Result<TrackerDocument> {
    rule_index(doc, index)?;
    let mut next = doc.clone();
    next.rules[index] = rule.into();
    Ok(next)
}

/// Delete the rule at `index`
///
/// # Errors
/// - `OutOfRange` if there is no rule at `index`
pub fn remove_rule(doc: &TrackerDocument, index: usize) -> Result<TrackerDocument> {
    rule_index(doc, index)?;
    let mut next = doc.clone();
    next.rules.remove(index);
    Ok(next)
}

/// Set a boolean flag
#[must_use]
pub fn set_flag(doc: &TrackerDocument, flag: Flag, value: bool) -> TrackerDocument {
    let mut next = doc.clone();
    next.flags.set(flag, value);
    next
}

/// Count one legendary encounter
#[must_use]
pub fn record_legendary_encounter(doc: &TrackerDocument) -> TrackerDocument {
    let mut next = doc.clone();
    next.stats.legendary_encounters = next.stats.legendary_encounters.saturating_add(1);
    next
}

/// Add `delta` to a player's Top 4 item count, clamped at zero
///
/// # Errors
/// - `PlayerOutOfRange` if `player` is not a player index
pub fn adjust_top4_items(doc: &TrackerDocument, player: usize, delta: i32) -> Result<TrackerDocument> {
    let players = doc.player_count();
    if player >= players {
        return Err(ProgressionError::PlayerOutOfRange {
            index: player,
            players,
        });
    }

    let mut next = doc.clone();
    let items = &mut next.stats.top4_items[player];
    *items = items.saturating_add_signed(delta);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soullink_test_utils::two_player_document;

    #[test]
    fn rename_keeps_count() {
        let doc = two_player_document();
        let doc = rename_player(&doc, 1, "  Dawn ").unwrap();
        assert_eq!(doc.players, vec!["Ash".to_string(), "Dawn".to_string()]);

        assert_eq!(rename_player(&doc, 0, "   ").unwrap_err(), ProgressionError::EmptyName);
        assert!(rename_player(&doc, 2, "Brock").unwrap_err().is_not_found());
    }

    #[test]
    fn rule_edits() {
        let doc = two_player_document();
        let count = doc.rules.len();

        let doc = add_rule(&doc, "No legendaries");
        assert_eq!(doc.rules.len(), count + 1);

        let doc = update_rule(&doc, count, "No legendaries, ever").unwrap();
        assert_eq!(doc.rules[count], "No legendaries, ever");

        let doc = remove_rule(&doc, 0).unwrap();
        assert_eq!(doc.rules.len(), count);
        assert!(remove_rule(&doc, count).is_err());
    }

    #[test]
    fn flags_and_counters() {
        let doc = set_flag(&two_player_document(), Flag::LegendaryTracker, true);
        assert!(doc.flags.legendary_tracker_enabled);

        let doc = record_legendary_encounter(&record_legendary_encounter(&doc));
        assert_eq!(doc.stats.legendary_encounters, 2);
    }

    #[test]
    fn top4_items_saturate_at_zero() {
        let doc = two_player_document();
        let doc = adjust_top4_items(&doc, 0, 3).unwrap();
        let doc = adjust_top4_items(&doc, 0, -5).unwrap();
        assert_eq!(doc.stats.top4_items, vec![0, 0]);

        let doc = adjust_top4_items(&doc, 1, 2).unwrap();
        assert_eq!(doc.stats.top4_items, vec![0, 2]);
        assert!(adjust_top4_items(&doc, 3, 1).is_err());
    }
}
