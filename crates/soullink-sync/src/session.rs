//! Session selection
//!
//! Chooses which tracker document is active. Selecting a tracker tears the
//! previous channel down before the next one attaches.

use crate::channel::{ReplicationChannel, SyncStatus};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::remote::RemoteStore;
use crate::store::DocumentStore;
use soullink_model::{TrackerDocument, TrackerId};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Owns the local store and the channel of the active session
#[derive(Debug)]
pub struct SessionManager<R: RemoteStore> {
    store: Arc<DocumentStore>,
    remote: Arc<R>,
    config: SyncConfig,
    channel: Option<ReplicationChannel>,
}

impl<R: RemoteStore> SessionManager<R> {
    /// Create manager without an active session
    #[must_use]
    pub fn new(remote: Arc<R>, config: SyncConfig) -> Self {
        Self {
            store: Arc::new(DocumentStore::new(config.change_buffer)),
            remote,
            config,
            channel: None,
        }
    }

    /// Local document store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Active tracker
    #[must_use]
    pub fn active(&self) -> Option<&TrackerId> {
        self.channel.as_ref().map(ReplicationChannel::tracker)
    }

    /// Replication status of the active session
    #[must_use]
    pub fn status(&self) -> Option<watch::Receiver<SyncStatus>> {
        self.channel.as_ref().map(ReplicationChannel::status)
    }

    /// Switch to `tracker`; `None` leaves no active document
    ///
    /// Selecting the already active tracker does nothing.
    ///
    /// # Errors
    /// - see [`ReplicationChannel::attach`]
    pub async fn select(&mut self, tracker: Option<TrackerId>, seed: TrackerDocument) -> Result<()> {
        if tracker.as_ref() == self.active() {
            return Ok(());
        }

        if let Some(previous) = self.channel.take() {
            info!(tracker = %previous.tracker(), "leaving session");
            previous.detach();
        }

        let Some(tracker) = tracker else {
            self.store.end_session();
            return Ok(());
        };

        let channel = ReplicationChannel::attach(
            Arc::clone(&self.store),
            Arc::clone(&self.remote),
            tracker,
            seed,
            &self.config,
        )
        .await?;
        self.channel = Some(channel);
        Ok(())
    }

    /// Leave the active session
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.detach();
        }
    }
}
