//! Team, box and graveyard edits

use crate::error::{ProgressionError, Result};
use soullink_model::{LinkedPair, Member, PairId, Slot, TrackerDocument, TEAM_CAPACITY};

/// Single edit applied to an existing pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairEdit {
    /// Replace the route
    Route(String),
    /// Replace one player's member
    Member {
        /// Player index
        player: usize,
        /// New member
        member: Member,
    },
}

fn check_player(doc: &TrackerDocument, index: usize) -> Result<()> {
    let players = doc.player_count();
    if index < players {
        Ok(())
    } else {
        Err(ProgressionError::PlayerOutOfRange { index, players })
    }
}

fn check_team_capacity(doc: &TrackerDocument, slot: Slot) -> Result<()> {
    if slot == Slot::Team && doc.team_is_full() {
        Err(ProgressionError::TeamFull(doc.team.len()))
    } else {
        Ok(())
    }
}

/// Append a new pair to `slot`
///
/// The pair gets the next creation-order id; `members` is padded or
/// truncated to the player count.
///
/// # Errors
/// - `TeamFull` if `slot` is the team and it already holds six pairs
pub fn add_pair(
    doc: &TrackerDocument,
    slot: Slot,
    route: impl Into<String>,
    members: Vec<Member>,
) -> Result<TrackerDocument> {
    check_team_capacity(doc, slot)?;

    let mut pair = LinkedPair::new(doc.next_pair_id(), route, members);
    pair.resize_members(doc.player_count());

    let mut next = doc.clone();
    next.pairs_mut(slot).push(pair);
    Ok(next)
}

/// Edit an existing pair in place
///
/// # Errors
/// - `PairNotFound` if no pair has `id`
/// - `PlayerOutOfRange` if a member edit targets a missing player
pub fn update_pair(doc: &TrackerDocument, id: PairId, edit: PairEdit) -> Result<TrackerDocument> {
    let (slot, idx) = doc.find_pair(id).ok_or(ProgressionError::PairNotFound(id))?;
    if let PairEdit::Member { player, .. } = &edit {
        check_player(doc, *player)?;
    }

    let mut next = doc.clone();
    let pair = &mut next.pairs_mut(slot)[idx];
    match edit {
        PairEdit::Route(route) => pair.route = route,
        PairEdit::Member { player, member } => pair.members[player] = member,
    }
    Ok(next)
}

/// Move a pair to the end of another slot
///
/// Moving out of the graveyard revives the pair. Moving into the slot the
/// pair already occupies leaves the document unchanged.
///
/// # Errors
/// - `PairNotFound` if no pair has `id`
/// - `TeamFull` if the destination is a full team
pub fn move_pair(doc: &TrackerDocument, id: PairId, to: Slot) -> Result<TrackerDocument> {
    let (from, idx) = doc.find_pair(id).ok_or(ProgressionError::PairNotFound(id))?;
    if from == to {
        return Ok(doc.clone());
    }
    check_team_capacity(doc, to)?;

    if from == Slot::Graveyard {
        tracing::debug!(pair = id, to = %to, "pair revived");
    }

    let mut next = doc.clone();
    let pair = next.pairs_mut(from).remove(idx);
    next.pairs_mut(to).push(pair);
    Ok(next)
}

/// Delete a pair
///
/// # Errors
/// - `PairNotFound` if no pair has `id`
pub fn remove_pair(doc: &TrackerDocument, id: PairId) -> Result<TrackerDocument> {
    let (slot, idx) = doc.find_pair(id).ok_or(ProgressionError::PairNotFound(id))?;
    let mut next = doc.clone();
    next.pairs_mut(slot).remove(idx);
    Ok(next)
}

/// Record a loss: the pair goes to the graveyard and the culprit's death
/// counter increases by one
///
/// Only pairs in the team or box qualify; a pair already in the graveyard
/// is not found.
///
/// # Errors
/// - `PairNotFound` if no pair with `id` is in the team or box
/// - `PlayerOutOfRange` if `culprit` is not a player index
pub fn add_loss(doc: &TrackerDocument, id: PairId, culprit: usize) -> Result<TrackerDocument> {
    let (slot, idx) = doc
        .find_pair(id)
        .filter(|(slot, _)| *slot != Slot::Graveyard)
        .ok_or(ProgressionError::PairNotFound(id))?;
    check_player(doc, culprit)?;

    let mut next = doc.clone();
    let pair = next.pairs_mut(slot).remove(idx);
    next.graveyard.push(pair);
    let deaths = &mut next.stats.deaths[culprit];
    *deaths = deaths.saturating_add(1);
    Ok(next)
}

/// Number of pairs the team can still take
#[inline]
#[must_use]
pub fn team_space(doc: &TrackerDocument) -> usize {
    TEAM_CAPACITY.saturating_sub(doc.team.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use soullink_test_utils::{fixture_document, two_player_document};

    #[test]
    fn add_pair_assigns_next_id_and_pads_members() {
        let doc = two_player_document();
        let doc = add_pair(&doc, Slot::Box, "Route 204", vec![Member::new("Budew", "Bud")]).unwrap();
        let doc = add_pair(&doc, Slot::Box, "Route 205", Vec::new()).unwrap();

        assert_eq!(doc.boxed[0].id, 1);
        assert_eq!(doc.boxed[1].id, 2);
        assert_eq!(doc.boxed[0].members, vec![Member::new("Budew", "Bud"), Member::default()]);
    }

    #[test]
    fn team_capacity_is_enforced() {
        let mut doc = two_player_document();
        for i in 0..TEAM_CAPACITY {
            doc = add_pair(&doc, Slot::Team, format!("Route {i}"), Vec::new()).unwrap();
        }
        assert_eq!(team_space(&doc), 0);
        assert_eq!(
            add_pair(&doc, Slot::Team, "Route 7", Vec::new()).unwrap_err(),
            ProgressionError::TeamFull(TEAM_CAPACITY)
        );

        let boxed = add_pair(&doc, Slot::Box, "Route 7", Vec::new()).unwrap();
        let id = boxed.boxed[0].id;
        assert!(move_pair(&boxed, id, Slot::Team).is_err());
    }

    #[test]
    fn update_pair_edits() {
        let doc = fixture_document();
        let doc = update_pair(&doc, 1, PairEdit::Route("Lake Verity".into())).unwrap();
        let doc = update_pair(
            &doc,
            1,
            PairEdit::Member {
                player: 1,
                member: Member::new("Psyduck", "Duck"),
            },
        )
        .unwrap();

        let pair = doc.pair(1).unwrap();
        assert_eq!(pair.route, "Lake Verity");
        assert_eq!(pair.member(1), Some(&Member::new("Psyduck", "Duck")));

        let bad = PairEdit::Member {
            player: 2,
            member: Member::default(),
        };
        assert!(update_pair(&doc, 1, bad).is_err());
        assert_eq!(
            update_pair(&doc, 99, PairEdit::Route(String::new())).unwrap_err(),
            ProgressionError::PairNotFound(99)
        );
    }

    #[test]
    fn move_and_revive() {
        let doc = fixture_document();
        let grave_id = doc.graveyard[0].id;

        let doc = move_pair(&doc, grave_id, Slot::Team).unwrap();
        assert!(doc.graveyard.is_empty());
        assert_eq!(doc.team.last().map(|p| p.id), Some(grave_id));

        assert_eq!(move_pair(&doc, grave_id, Slot::Team).unwrap(), doc);
    }

    #[test]
    fn remove_pair_deletes() {
        let doc = fixture_document();
        let doc = remove_pair(&doc, 3).unwrap();
        assert!(doc.pair(3).is_none());
        assert!(remove_pair(&doc, 3).is_err());
    }

    #[test]
    fn add_loss_moves_once() {
        let doc = fixture_document();
        let id = doc.team[0].id;

        let after = add_loss(&doc, id, 1).unwrap();
        assert_eq!(after.stats.deaths, vec![0, 1]);
        assert_eq!(after.graveyard.last().map(|p| p.id), Some(id));
        assert_eq!(after.team.len(), doc.team.len() - 1);

        assert_eq!(add_loss(&after, id, 1).unwrap_err(), ProgressionError::PairNotFound(id));
        assert!(matches!(
            add_loss(&doc, id, 2),
            Err(ProgressionError::PlayerOutOfRange { index: 2, players: 2 })
        ));
    }
}
