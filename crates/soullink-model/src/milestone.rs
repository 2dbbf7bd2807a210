//! Milestones: gym-badge style level caps and rival encounters
//!
//! Identity (`id`, `label`, `level`) is fixed when the document is created
//! from a game template; only `done` and `revealed` ever change.

use serde::{Deserialize, Serialize};

/// Common view over ordered, completable milestones
pub trait Progress {
    /// Stable ordinal
    fn id(&self) -> u32;

    /// Whether the milestone is completed
    fn is_done(&self) -> bool;

    /// Set completion state
    fn set_done(&mut self, done: bool);

    /// Check identity fields against another milestone
    fn same_identity(&self, other: &Self) -> bool;
}

/// Level cap milestone (gym, Top 4, Champion)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Stable ordinal
    pub id: u32,
    /// Display label
    pub label: String,
    /// Display level value
    pub level: String,
    /// Completed
    pub done: bool,
}

impl Milestone {
    /// Create pending milestone
    #[inline]
    #[must_use]
    pub fn new(id: u32, label: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            level: level.into(),
            done: false,
        }
    }

    /// Same identity, not done
    #[inline]
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            done: false,
            ..self.clone()
        }
    }
}

impl Progress for Milestone {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id && self.label == other.label && self.level == other.level
    }
}

/// Rival encounter milestone with a reveal flag
///
/// When rival censoring is enabled the UI hides unrevealed rivals; once
/// `revealed` is set it never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalMilestone {
    /// Stable ordinal
    pub id: u32,
    /// Display label
    pub label: String,
    /// Display level value
    pub level: String,
    /// Completed
    pub done: bool,
    /// Shown to players
    pub revealed: bool,
}

impl RivalMilestone {
    /// Create pending, unrevealed rival milestone
    #[inline]
    #[must_use]
    pub fn new(id: u32, label: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            level: level.into(),
            done: false,
            revealed: false,
        }
    }

    /// Same identity, not done, not revealed
    #[inline]
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            done: false,
            revealed: false,
            ..self.clone()
        }
    }
}

impl Progress for RivalMilestone {
    fn id(&self) -> u32 {
        self.id
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id && self.label == other.label && self.level == other.level
    }
}

/// Index of the first milestone not yet done (the "current" one)
#[must_use]
pub fn first_pending<P: Progress>(caps: &[P]) -> Option<usize> {
    caps.iter().position(|m| !m.is_done())
}

/// Index of the last milestone marked done
#[must_use]
pub fn last_done<P: Progress>(caps: &[P]) -> Option<usize> {
    caps.iter().rposition(Progress::is_done)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(done: &[bool]) -> Vec<Milestone> {
        done.iter()
            .enumerate()
            .map(|(i, d)| {
                let mut m = Milestone::new(i as u32 + 1, format!("Gym {}", i + 1), "10");
                m.done = *d;
                m
            })
            .collect()
    }

    #[test]
    fn first_pending_and_last_done() {
        let c = caps(&[true, true, false, false]);
        assert_eq!(first_pending(&c), Some(2));
        assert_eq!(last_done(&c), Some(1));

        let all = caps(&[true, true]);
        assert_eq!(first_pending(&all), None);

        let none = caps(&[false, false]);
        assert_eq!(last_done(&none), None);
    }

    #[test]
    fn cleared_keeps_identity() {
        let mut rival = RivalMilestone::new(2, "Barry", "9");
        rival.done = true;
        rival.revealed = true;

        let cleared = rival.cleared();
        assert!(cleared.same_identity(&rival));
        assert!(!cleared.done);
        assert!(!cleared.revealed);
    }
}
