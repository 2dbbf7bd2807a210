//! Milestone toggles, rival reveals and the best-run ratchet
//!
//! Both milestone sequences keep a contiguous done prefix: only the first
//! pending entry may be marked done and only the last done entry may be
//! un-marked. Requests that would break the prefix are rejected.

use crate::error::{ProgressionError, Result};
use soullink_model::{
    first_pending, last_done, Progress, RivalMilestone, TrackerDocument, BADGE_COUNT,
    FIRST_POST_BADGE_ID,
};

/// Flip `done` at `index`, keeping the done prefix contiguous
fn toggle<P: Progress>(caps: &mut [P], index: usize, what: &'static str) -> Result<bool> {
    let len = caps.len();
    let done = caps
        .get(index)
        .ok_or(ProgressionError::OutOfRange { what, index, len })?
        .is_done();

    let eligible = if done { last_done(caps) } else { first_pending(caps) };
    if eligible != Some(index) {
        return Err(ProgressionError::OutOfOrder {
            what,
            index,
            eligible,
        });
    }

    caps[index].set_done(!done);
    Ok(!done)
}

/// Toggle the level cap at `index`
///
/// # Errors
/// - `OutOfRange` if `index` is past the last level cap
/// - `OutOfOrder` if the toggle would leave a gap in the done prefix
pub fn toggle_level_cap(doc: &TrackerDocument, index: usize) -> Result<TrackerDocument> {
    let mut next = doc.clone();
    toggle(&mut next.level_caps, index, "level cap")?;
    Ok(next)
}

/// Toggle the rival cap at `index`; marking it done also reveals it
///
/// # Errors
/// - `OutOfRange` if `index` is past the last rival cap
/// - `OutOfOrder` if the toggle would leave a gap in the done prefix
pub fn toggle_rival_cap(doc: &TrackerDocument, index: usize) -> Result<TrackerDocument> {
    let mut next = doc.clone();
    if toggle(&mut next.rival_caps, index, "rival cap")? {
        next.rival_caps[index].revealed = true;
    }
    Ok(next)
}

/// Index of the current (first pending) level cap
#[inline]
#[must_use]
pub fn current_level_cap(doc: &TrackerDocument) -> Option<usize> {
    first_pending(&doc.level_caps)
}

/// Index of the current (first pending) rival cap
#[inline]
#[must_use]
pub fn current_rival_cap(doc: &TrackerDocument) -> Option<usize> {
    first_pending(&doc.rival_caps)
}

/// First rival that has not been revealed yet
#[must_use]
pub fn next_unrevealed(caps: &[RivalMilestone]) -> Option<usize> {
    caps.iter().position(|r| !r.revealed)
}

/// Reveal the rival at `index`
///
/// # Errors
/// - `OutOfRange` if `index` is past the last rival cap
/// - `AlreadyRevealed` if it is already revealed
/// - `CensoredReveal` if censoring is on and it is not the next unrevealed rival
pub fn reveal_rival(doc: &TrackerDocument, index: usize) -> Result<TrackerDocument> {
    let len = doc.rival_caps.len();
    let rival = doc.rival_caps.get(index).ok_or(ProgressionError::OutOfRange {
        what: "rival cap",
        index,
        len,
    })?;
    if rival.revealed {
        return Err(ProgressionError::AlreadyRevealed(index));
    }
    if doc.flags.rival_censor_enabled {
        let eligible = next_unrevealed(&doc.rival_caps);
        if eligible != Some(index) {
            return Err(ProgressionError::CensoredReveal { index, eligible });
        }
    }

    let mut next = doc.clone();
    next.rival_caps[index].revealed = true;
    Ok(next)
}

/// Number of completed badges: done entries among the first eight level caps
/// whose id is below the post-badge range
#[must_use]
pub fn compute_best(doc: &TrackerDocument) -> u32 {
    let badges = doc
        .level_caps
        .iter()
        .take(BADGE_COUNT)
        .filter(|m| m.id < FIRST_POST_BADGE_ID && m.done)
        .count();
    u32::try_from(badges).unwrap_or(u32::MAX)
}

/// Raise `stats.best` to the current badge count; never lowers it
pub fn ratchet_best(doc: &mut TrackerDocument) {
    let best = compute_best(doc);
    if best > doc.stats.best {
        tracing::trace!(from = doc.stats.best, to = best, "best run raised");
        doc.stats.best = best;
    }
}
