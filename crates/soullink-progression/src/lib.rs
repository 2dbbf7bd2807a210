//! Soullink Progression Engine
//!
//! Pure transforms over `TrackerDocument`: milestone toggles, rival
//! reveals, run resets, roster edits and the best-run ratchet.
//!
//! Every operation takes the current document by reference and returns the
//! next one. A rejected operation returns a [`ProgressionError`] and the
//! caller keeps the previous document, so an invalid request can never
//! corrupt state.
//!
//! # Example
//!
//! ```rust,ignore
//! use soullink_progression::{ratchet_best, reset_run, toggle_level_cap, ResetMode};
//!
//! let mut doc = toggle_level_cap(&doc, 0)?;
//! ratchet_best(&mut doc);
//! let doc = reset_run(&doc, ResetMode::Current, now_ms);
//! ```

#![warn(unreachable_pub)]

// Core modules
mod error;
mod milestones;
mod reset;
mod roster;
mod settings;

// Re-exports
pub use error::{ProgressionError, Result};
pub use milestones::{
    compute_best, current_level_cap, current_rival_cap, next_unrevealed, ratchet_best,
    reveal_rival, toggle_level_cap, toggle_rival_cap,
};
pub use reset::{reset_run, ResetMode};
pub use roster::{add_loss, add_pair, move_pair, remove_pair, team_space, update_pair, PairEdit};
pub use settings::{
    add_rule, adjust_top4_items, rename_player, record_legendary_encounter, remove_rule,
    set_flag, update_rule,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
