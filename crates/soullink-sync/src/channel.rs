//! Replication channel
//!
//! Bridges the local store and a remote store for one session:
//!
//! 1. Attach: one-shot fetch, sanitize, install as the first document.
//! 2. Subscribe: every push notification is sanitized against the
//!    last-known-good document and replaces the local one.
//! 3. Publish: locally originated changes are written wholesale.
//! 4. Detach: the session generation is invalidated and both tasks stop.
//!
//! Publishing is decided from the change's origin tag alone. A remote change
//! is never written back, so each remote change costs at most one round trip.

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::remote::{RemoteStore, Subscription};
use crate::retry::RetryPolicy;
use crate::store::{ChangeOrigin, DocumentChange, DocumentStore};
use futures::StreamExt;
use soullink_model::{DocumentPath, TrackerDocument, TrackerId};
use soullink_sanitizer::coerce;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Replication state for an "unsaved changes" indicator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// A local change has not reached the remote store yet
    pub pending: bool,
    /// Successful writes
    pub published: u64,
    /// Remote changes that were not written back
    pub suppressed_echoes: u64,
    /// Writes that failed after all retries
    pub failed_writes: u64,
    /// Last write error
    pub last_error: Option<String>,
}

/// Replication for one tracker session
#[derive(Debug)]
pub struct ReplicationChannel {
    tracker: TrackerId,
    generation: u64,
    store: Arc<DocumentStore>,
    status: watch::Receiver<SyncStatus>,
    tasks: Vec<JoinHandle<()>>,
}

impl ReplicationChannel {
    /// Attach `tracker` to `store`
    ///
    /// `seed` is the default document used when the remote document is
    /// absent (it is published) or unreadable (it is shown but held back
    /// until the first local edit). It also serves as the fallback for
    /// sanitizing the initial snapshot.
    ///
    /// # Errors
    /// - `SyncError::Remote` if the push subscription cannot be registered
    /// - `SyncError::SessionClosed` if another session started meanwhile
    pub async fn attach<R: RemoteStore>(
        store: Arc<DocumentStore>,
        remote: Arc<R>,
        tracker: TrackerId,
        seed: TrackerDocument,
        config: &SyncConfig,
    ) -> Result<Self> {
        let generation = store.begin_session(tracker.clone());
        let changes = store.subscribe();
        let path = DocumentPath::for_tracker(&config.path_prefix, &tracker);

        // Registered before the fetch so no later write is missed; buffered
        // notifications are processed against the installed document.
        let subscription = remote.subscribe(&path).await?;

        let (document, origin) = match remote.fetch(&path).await {
            Ok(Some(raw)) => (coerce(&raw, &seed), ChangeOrigin::Remote),
            Ok(None) => {
                info!(tracker = %tracker, "no remote document, seeding default");
                (seed, ChangeOrigin::Local)
            }
            Err(err) => {
                warn!(tracker = %tracker, error = %err, "initial fetch failed, using default document");
                (seed, ChangeOrigin::Fallback)
            }
        };

        // Installed before the task runs so no notification meets an empty store
        if !store.complete_attach(generation, document, origin) {
            return Err(SyncError::SessionClosed);
        }

        let (status_tx, status) = watch::channel(SyncStatus::default());
        let status_tx = Arc::new(status_tx);
        let (pending_tx, pending_rx) = watch::channel(None);

        let writer = tokio::spawn(write_loop(
            Arc::clone(&remote),
            path.clone(),
            RetryPolicy::new(config.retry.clone()),
            pending_rx,
            Arc::clone(&status_tx),
        ));
        let task = tokio::spawn(
            ChannelTask {
                tracker: tracker.clone(),
                generation,
                store: Arc::clone(&store),
                pending: pending_tx,
                status: status_tx,
            }
            .run(subscription, changes),
        );
        let channel = Self {
            tracker,
            generation,
            store,
            status,
            tasks: vec![task, writer],
        };
        info!(tracker = %channel.tracker, generation, ?origin, "session attached");
        Ok(channel)
    }

    /// Attached tracker
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &TrackerId {
        &self.tracker
    }

    /// Session generation owned by this channel
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replication status updates
    #[must_use]
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Check if the channel still owns the store's session
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store.generation() == self.generation
    }

    /// Stop replicating and leave the session
    ///
    /// The store's session ends unless a newer one already replaced it.
    pub fn detach(mut self) {
        if self.is_active() {
            self.store.end_session();
        }
        self.abort_tasks();
        debug!(tracker = %self.tracker, generation = self.generation, "session detached");
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for ReplicationChannel {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Event loop for one session
struct ChannelTask {
    tracker: TrackerId,
    generation: u64,
    store: Arc<DocumentStore>,
    pending: watch::Sender<Option<Arc<TrackerDocument>>>,
    status: Arc<watch::Sender<SyncStatus>>,
}

impl ChannelTask {
    async fn run(
        self,
        mut subscription: Subscription,
        mut changes: broadcast::Receiver<DocumentChange>,
    ) {
        let mut remote_open = true;
        loop {
            tokio::select! {
                notification = subscription.next(), if remote_open => match notification {
                    Some(raw) => {
                        if !self.handle_notification(&raw) {
                            break;
                        }
                    }
                    None => {
                        warn!(tracker = %self.tracker, "remote subscription closed");
                        remote_open = false;
                    }
                },
                change = changes.recv() => match change {
                    Ok(change) => {
                        if !self.handle_change(change) {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(tracker = %self.tracker, skipped, "change stream lagged, republishing");
                        self.republish_current();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!(tracker = %self.tracker, generation = self.generation, "channel task stopped");
    }

    /// Returns `false` once the session is stale
    fn handle_notification(&self, raw: &serde_json::Value) -> bool {
        if self.store.generation() != self.generation {
            return false;
        }
        let Some(current) = self.store.document() else {
            return false;
        };

        let document = coerce(raw, &current);
        if document == *current {
            self.status.send_modify(|s| s.suppressed_echoes += 1);
            return true;
        }
        self.store.replace_from_remote(self.generation, document)
            || self.store.generation() == self.generation
    }

    /// Returns `false` once a newer session produced changes
    fn handle_change(&self, change: DocumentChange) -> bool {
        if change.generation != self.generation {
            return change.generation < self.generation;
        }

        if change.origin.should_publish() && change.ready {
            self.status.send_modify(|s| s.pending = true);
            self.pending.send_replace(Some(change.document));
        } else if change.origin == ChangeOrigin::Remote {
            self.status.send_modify(|s| s.suppressed_echoes += 1);
        } else {
            debug!(tracker = %self.tracker, "fallback document held back");
        }
        true
    }

    fn republish_current(&self) {
        let snapshot = self.store.snapshot();
        if let (true, Some(document)) = (snapshot.ready, snapshot.document) {
            self.status.send_modify(|s| s.pending = true);
            self.pending.send_replace(Some(document));
        }
    }
}

/// Writes the latest pending snapshot; older unsent snapshots are skipped
async fn write_loop<R: RemoteStore>(
    remote: Arc<R>,
    path: DocumentPath,
    policy: RetryPolicy,
    mut pending: watch::Receiver<Option<Arc<TrackerDocument>>>,
    status: Arc<watch::Sender<SyncStatus>>,
) {
    while pending.changed().await.is_ok() {
        let Some(document) = pending.borrow_and_update().clone() else {
            continue;
        };

        let result = match serde_json::to_value(document.as_ref()) {
            Ok(value) => {
                policy
                    .run(|| remote.write(&path, value.clone()))
                    .await
            }
            Err(err) => Err(err.into()),
        };

        let more = pending.has_changed().unwrap_or(false);
        match result {
            Ok(()) => {
                debug!(%path, "document published");
                status.send_modify(|s| {
                    s.published += 1;
                    s.pending = more;
                    s.last_error = None;
                });
            }
            Err(err) => {
                warn!(%path, error = %err, attempts = policy.max_attempts(), "document write failed");
                status.send_modify(|s| {
                    s.failed_writes += 1;
                    s.pending = more;
                    s.last_error = Some(err.to_string());
                });
            }
        }
    }
}
