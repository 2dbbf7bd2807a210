//! Soullink Command Line Tools
//!
//! Offline tooling around tracker documents:
//!
//! - [`commands`]: create, sanitize and inspect document files
//! - [`simulator`]: seeded multi-client replication runs against an
//!   in-memory remote store

#![warn(unreachable_pub)]

pub mod commands;
pub mod simulator;

pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
