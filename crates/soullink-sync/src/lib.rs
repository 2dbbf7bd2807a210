//! Soullink Tracker Sync
//!
//! Keeps one tracker document consistent between this process and a shared
//! remote document store.
//!
//! # Core Concepts
//!
//! - [`DocumentStore`]: Canonical local document plus a `ready` flag; every
//!   change carries a [`ChangeOrigin`]
//! - [`ReplicationChannel`]: Fetch-then-subscribe lifecycle, publishing of
//!   local changes, echo suppression by origin
//! - [`RemoteStore`]: Interface of the shared store ([`InMemoryRemoteStore`]
//!   for tests and simulations)
//! - [`SessionManager`]: Selects the active tracker
//!
//! # Example
//!
//! ```rust,ignore
//! use soullink_sync::{InMemoryRemoteStore, SessionManager, SyncConfig};
//!
//! let mut sessions = SessionManager::new(Arc::new(InMemoryRemoteStore::default()), SyncConfig::new());
//! sessions.select(Some(tracker), seed).await?;
//! sessions.store().try_apply(|doc| toggle_level_cap(doc, 0))?;
//! ```

#![warn(unreachable_pub)]

// Core modules
mod channel;
mod config;
mod error;
mod remote;
mod retry;
mod session;
mod store;

// Re-exports
pub use channel::{ReplicationChannel, SyncStatus};
pub use config::{RetryConfig, SyncConfig};
pub use error::{ConfigError, RemoteError, Result, SyncError};
pub use remote::{InMemoryRemoteStore, RemoteStore, Subscription, WriteRecord};
pub use retry::RetryPolicy;
pub use session::SessionManager;
pub use store::{ChangeOrigin, DocumentChange, DocumentStore, StoreSnapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
