//! Error types for progression operations
//!
//! Every error is a rejected no-op: the caller keeps the previous document.

use soullink_model::PairId;

/// Reason a progression operation was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    /// Index past the end of a sequence
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        /// Sequence name
        what: &'static str,
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// Toggle would break the contiguous done prefix
    #[error("{what} {index} is out of order (eligible: {eligible:?})")]
    OutOfOrder {
        /// Sequence name
        what: &'static str,
        /// Requested index
        index: usize,
        /// Index that may be toggled in that direction, if any
        eligible: Option<usize>,
    },

    /// Rival already revealed
    #[error("rival {0} already revealed")]
    AlreadyRevealed(usize),

    /// Censor allows only the first unrevealed rival
    #[error("rival {index} is censored (next reveal: {eligible:?})")]
    CensoredReveal {
        /// Requested index
        index: usize,
        /// First unrevealed rival
        eligible: Option<usize>,
    },

    /// Team already holds the maximum number of pairs
    #[error("team is full ({0} pairs)")]
    TeamFull(usize),

    /// No pair with this id in the searched slots
    #[error("pair {0} not found")]
    PairNotFound(PairId),

    /// Player index past the player list
    #[error("player index {index} out of range ({players} players)")]
    PlayerOutOfRange {
        /// Requested index
        index: usize,
        /// Player count
        players: usize,
    },

    /// Player names must not be blank
    #[error("name must not be empty")]
    EmptyName,
}

impl ProgressionError {
    /// Check if the error refers to something that does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange { .. } | Self::PairNotFound(_) | Self::PlayerOutOfRange { .. }
        )
    }

    /// Check if the error protects a document invariant
    #[inline]
    #[must_use]
    pub fn is_invariant_guard(&self) -> bool {
        matches!(
            self,
            Self::OutOfOrder { .. } | Self::TeamFull(_) | Self::CensoredReveal { .. }
        )
    }
}

/// Result alias for progression operations
pub type Result<T> = std::result::Result<T, ProgressionError>;
