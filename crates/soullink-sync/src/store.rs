//! Local document store
//!
//! Holds the canonical document of the active session. Every change is
//! broadcast with an origin tag; the replication channel publishes only
//! locally originated changes, which is what keeps remote echoes from being
//! written back.
//!
//! Sessions are numbered. Switching or ending a session bumps the generation,
//! and any callback still carrying an older generation is ignored.

use crate::error::{Result, SyncError};
use parking_lot::Mutex;
use soullink_model::{TrackerDocument, TrackerId};
use soullink_progression::{ratchet_best, ProgressionError};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Where a document change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Mutation issued in this process
    Local,
    /// Snapshot or push notification from the remote store
    Remote,
    /// Default document seeded after the initial read failed
    Fallback,
}

impl ChangeOrigin {
    /// Check if a change with this origin must be written to the remote store
    #[inline]
    #[must_use]
    pub fn should_publish(self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Document change event
#[derive(Debug, Clone)]
pub struct DocumentChange {
    /// Session tracker
    pub tracker: TrackerId,
    /// Session generation that produced the change
    pub generation: u64,
    /// New document
    pub document: Arc<TrackerDocument>,
    /// Origin tag
    pub origin: ChangeOrigin,
    /// Whether the session finished attaching
    pub ready: bool,
}

/// Read-only view of the store
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Active tracker, if a session is selected
    pub tracker: Option<TrackerId>,
    /// Current document; `None` while loading or without a session
    pub document: Option<Arc<TrackerDocument>>,
    /// Attach finished; consumers must not persist before this
    pub ready: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    tracker: Option<TrackerId>,
    document: Option<Arc<TrackerDocument>>,
    ready: bool,
    generation: u64,
}

/// Canonical in-memory document for the active session
#[derive(Debug)]
pub struct DocumentStore {
    state: Mutex<StoreState>,
    changes: broadcast::Sender<DocumentChange>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(256)
    }
}

impl DocumentStore {
    /// Create store without a session; `buffer` bounds the change broadcast
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(buffer.max(1));
        Self {
            state: Mutex::new(StoreState::default()),
            changes,
        }
    }

    /// Subscribe to document changes
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.changes.subscribe()
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock();
        StoreSnapshot {
            tracker: state.tracker.clone(),
            document: state.document.clone(),
            ready: state.ready,
        }
    }

    /// Current document
    #[must_use]
    pub fn document(&self) -> Option<Arc<TrackerDocument>> {
        self.state.lock().document.clone()
    }

    /// Whether the active session finished attaching
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Current session generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Start loading a new session, discarding the previous document
    pub fn begin_session(&self, tracker: TrackerId) -> u64 {
        let mut state = self.state.lock();
        state.generation += 1;
        debug!(tracker = %tracker, generation = state.generation, "session loading");
        state.tracker = Some(tracker);
        state.document = None;
        state.ready = false;
        state.generation
    }

    /// Leave the active session; the store holds no document afterwards
    pub fn end_session(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        debug!(generation = state.generation, "session ended");
        state.tracker = None;
        state.document = None;
        state.ready = false;
    }

    /// Install the first document of a session and mark it ready
    ///
    /// Returns `false` if `generation` is no longer the active session.
    pub fn complete_attach(
        &self,
        generation: u64,
        document: TrackerDocument,
        origin: ChangeOrigin,
    ) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation || state.tracker.is_none() {
            debug!(generation, current = state.generation, "stale attach ignored");
            return false;
        }
        state.ready = true;
        self.install(&mut state, Arc::new(document), origin);
        true
    }

    /// Replace the document with a remote snapshot
    ///
    /// Returns `false` if `generation` is stale or the session is not ready.
    pub fn replace_from_remote(&self, generation: u64, document: TrackerDocument) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation || !state.ready {
            debug!(generation, current = state.generation, "stale remote change ignored");
            return false;
        }
        self.install(&mut state, Arc::new(document), ChangeOrigin::Remote);
        true
    }

    /// Apply an infallible local mutation
    ///
    /// # Errors
    /// - `SyncError::NoActiveDocument` while loading or without a session
    pub fn apply_mutation<F>(&self, mutation: F) -> Result<Arc<TrackerDocument>>
    where
        F: FnOnce(&TrackerDocument) -> TrackerDocument,
    {
        self.try_apply(|doc| Ok(mutation(doc)))
    }

    /// Apply a local mutation that may be rejected
    ///
    /// A rejected mutation leaves the document untouched and emits nothing.
    ///
    /// # Errors
    /// - `SyncError::NoActiveDocument` while loading or without a session
    /// - `SyncError::Rejected` with the progression error
    pub fn try_apply<F>(&self, mutation: F) -> Result<Arc<TrackerDocument>>
    where
        F: FnOnce(&TrackerDocument) -> std::result::Result<TrackerDocument, ProgressionError>,
    {
        let mut state = self.state.lock();
        let current = state
            .document
            .as_ref()
            .filter(|_| state.ready)
            .ok_or(SyncError::NoActiveDocument)?;

        let mut next = mutation(current)?;
        ratchet_best(&mut next);
        let next = Arc::new(next);
        self.install(&mut state, Arc::clone(&next), ChangeOrigin::Local);
        Ok(next)
    }

    fn install(&self, state: &mut StoreState, document: Arc<TrackerDocument>, origin: ChangeOrigin) {
        state.document = Some(Arc::clone(&document));
        let Some(tracker) = state.tracker.clone() else {
            return;
        };
        // Sent under the lock so subscribers see changes in store order
        let _ = self.changes.send(DocumentChange {
            tracker,
            generation: state.generation,
            document,
            origin,
            ready: state.ready,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use soullink_progression::{toggle_level_cap, ProgressionError};
    use soullink_test_utils::two_player_document;

    fn tracker(id: &str) -> TrackerId {
        TrackerId::new(id).unwrap()
    }

    fn attached() -> (DocumentStore, u64) {
        let store = DocumentStore::default();
        let generation = store.begin_session(tracker("run"));
        assert!(store.complete_attach(generation, two_player_document(), ChangeOrigin::Remote));
        (store, generation)
    }

    #[test]
    fn no_session_means_no_document() {
        let store = DocumentStore::default();
        let err = store.apply_mutation(Clone::clone).unwrap_err();
        assert!(matches!(err, SyncError::NoActiveDocument));
        assert!(store.snapshot().document.is_none());
    }

    #[test]
    fn loading_until_attached() {
        let store = DocumentStore::default();
        let generation = store.begin_session(tracker("run"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.tracker, Some(tracker("run")));
        assert!(!snapshot.ready);
        assert!(store.apply_mutation(Clone::clone).is_err());

        assert!(store.complete_attach(generation, two_player_document(), ChangeOrigin::Local));
        assert!(store.is_ready());
    }

    #[test]
    fn local_mutation_is_tagged_and_ratcheted() {
        let (store, generation) = attached();
        let mut changes = store.subscribe();

        let doc = store.try_apply(|d| toggle_level_cap(d, 0)).unwrap();
        assert_eq!(doc.stats.best, 1);

        let change = changes.try_recv().unwrap();
        assert_eq!(change.origin, ChangeOrigin::Local);
        assert_eq!(change.generation, generation);
        assert!(change.ready);
        assert!(change.origin.should_publish());
    }

    #[test]
    fn rejected_mutation_emits_nothing() {
        let (store, _) = attached();
        let before = store.document().unwrap();
        let mut changes = store.subscribe();

        let err = store.try_apply(|d| toggle_level_cap(d, 5)).unwrap_err();
        assert!(matches!(err, SyncError::Rejected(ProgressionError::OutOfOrder { .. })));
        assert_eq!(store.document().unwrap(), before);
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn remote_replacement_is_not_published() {
        let (store, generation) = attached();
        let mut changes = store.subscribe();

        let mut doc = two_player_document();
        doc.rules.clear();
        assert!(store.replace_from_remote(generation, doc.clone()));

        let change = changes.try_recv().unwrap();
        assert_eq!(change.origin, ChangeOrigin::Remote);
        assert!(!change.origin.should_publish());
        assert_eq!(*change.document, doc);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let (store, old) = attached();
        let new = store.begin_session(tracker("other"));
        assert!(new > old);

        assert!(!store.replace_from_remote(old, two_player_document()));
        assert!(!store.complete_attach(old, two_player_document(), ChangeOrigin::Remote));
        assert!(store.document().is_none());

        store.end_session();
        assert!(!store.complete_attach(new, two_player_document(), ChangeOrigin::Remote));
        assert_eq!(store.snapshot().tracker, None);
    }
}
