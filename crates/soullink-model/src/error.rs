//! Error types for the tracker model

/// Errors raised while constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Player count outside `MIN_PLAYERS..=MAX_PLAYERS`
    #[error("invalid player count: {0} (expected 1..=3)")]
    InvalidPlayerCount(usize),

    /// Tracker identifier is empty or contains a path separator
    #[error("invalid tracker id: '{0}'")]
    InvalidTrackerId(String),

    /// No built-in game template with this id
    #[error("unknown game template: {0}")]
    UnknownTemplate(String),

    /// No built-in ruleset with this id
    #[error("unknown ruleset: {0}")]
    UnknownRuleset(String),

    /// Slot name could not be parsed
    #[error("invalid slot: '{0}' (expected team, box or graveyard)")]
    InvalidSlot(String),
}
