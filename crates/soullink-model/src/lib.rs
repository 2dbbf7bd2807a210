//! Soullink Tracker Model
//!
//! Value types and invariants for the replicated tracker document.
//!
//! # Core Concepts
//!
//! - [`TrackerDocument`]: The single replicated aggregate for one challenge run
//! - [`LinkedPair`]: One cross-player soul link (one [`Member`] per player index)
//! - [`Milestone`] / [`RivalMilestone`]: Ordered, independently completable encounters
//! - [`GameTemplate`]: Game-version template supplying milestone identity at creation
//! - [`Ruleset`]: Externally referenced rule text
//! - [`TrackerId`] / [`DocumentPath`]: Addressing of the remote document
//!
//! # Example
//!
//! ```rust,ignore
//! use soullink_model::{GameTemplate, Ruleset, TrackerDocument};
//!
//! let template = GameTemplate::find("platinum").unwrap();
//! let ruleset = Ruleset::find("standard").unwrap();
//! let doc = TrackerDocument::create(&template, vec!["Ash".into(), "Misty".into()], &ruleset, 0)?;
//!
//! assert_eq!(doc.stats.deaths, vec![0, 0]);
//! ```

#![warn(unreachable_pub)]

// Core modules
mod document;
mod error;
mod id;
mod milestone;
mod pair;
mod ruleset;
mod template;

// Re-exports
pub use document::{
    resize_per_player, Flag, Flags, InvariantViolation, Stats, TrackerDocument, BADGE_COUNT,
    FIRST_POST_BADGE_ID, MAX_PLAYERS, MIN_PLAYERS, TEAM_CAPACITY,
};
pub use error::ModelError;
pub use id::{DocumentPath, TrackerId, DEFAULT_PATH_PREFIX};
pub use milestone::{first_pending, last_done, Milestone, Progress, RivalMilestone};
pub use pair::{LinkedPair, Member, PairId, Slot};
pub use ruleset::Ruleset;
pub use template::GameTemplate;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
