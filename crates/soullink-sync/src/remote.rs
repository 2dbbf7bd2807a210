//! Remote document store interface
//!
//! The remote store holds one JSON document per tracker path and pushes
//! every accepted write to all subscribers of that path, the writer
//! included. Writes replace the whole document (last writer wins).

use crate::error::RemoteError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use soullink_model::DocumentPath;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Push notifications for one path; dropping it unsubscribes
pub type Subscription = BoxStream<'static, Value>;

/// Shared remote document store
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// One-shot read; `Ok(None)` if no document exists at `path`
    async fn fetch(&self, path: &DocumentPath) -> Result<Option<Value>, RemoteError>;

    /// Replace the document at `path`
    async fn write(&self, path: &DocumentPath, document: Value) -> Result<(), RemoteError>;

    /// Register for push notifications on `path`
    async fn subscribe(&self, path: &DocumentPath) -> Result<Subscription, RemoteError>;
}

/// One accepted write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    /// Target path
    pub path: String,
    /// Written document
    pub document: Value,
}

#[derive(Debug)]
struct Inner {
    documents: Mutex<HashMap<String, Value>>,
    channels: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    history: Mutex<Vec<WriteRecord>>,
    failing_writes: AtomicUsize,
    failing_fetches: AtomicBool,
    buffer: usize,
}

/// In-process remote store with failure injection
///
/// Clones share the same state, so several clients can attach to one store.
#[derive(Debug, Clone)]
pub struct InMemoryRemoteStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new(64)
    }
}

impl InMemoryRemoteStore {
    /// Create empty store; `buffer` bounds each path's notification queue
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                documents: Mutex::new(HashMap::new()),
                channels: Mutex::new(HashMap::new()),
                history: Mutex::new(Vec::new()),
                failing_writes: AtomicUsize::new(0),
                failing_fetches: AtomicBool::new(false),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Fail the next `count` writes with a retryable error
    pub fn fail_next_writes(&self, count: usize) {
        self.inner.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Make every fetch fail until switched off
    pub fn fail_fetches(&self, fail: bool) {
        self.inner.failing_fetches.store(fail, Ordering::SeqCst);
    }

    /// Current document at `path`
    #[must_use]
    pub fn get(&self, path: &DocumentPath) -> Option<Value> {
        self.inner.documents.lock().get(path.as_str()).cloned()
    }

    /// Store a document without going through failure injection
    ///
    /// Subscribers are notified as for [`RemoteStore::write`].
    pub fn put(&self, path: &DocumentPath, document: Value) {
        self.accept(path, document);
    }

    /// All accepted writes in order
    #[must_use]
    pub fn history(&self) -> Vec<WriteRecord> {
        self.inner.history.lock().clone()
    }

    /// Number of accepted writes to `path`
    #[must_use]
    pub fn write_count(&self, path: &DocumentPath) -> usize {
        self.inner
            .history
            .lock()
            .iter()
            .filter(|w| w.path == path.as_str())
            .count()
    }

    /// Number of live subscriptions on `path`
    #[must_use]
    pub fn subscriber_count(&self, path: &DocumentPath) -> usize {
        self.inner
            .channels
            .lock()
            .get(path.as_str())
            .map_or(0, broadcast::Sender::receiver_count)
    }

    fn accept(&self, path: &DocumentPath, document: Value) {
        let mut documents = self.inner.documents.lock();
        documents.insert(path.to_string(), document.clone());
        self.inner.history.lock().push(WriteRecord {
            path: path.to_string(),
            document: document.clone(),
        });
        if let Some(sender) = self.inner.channels.lock().get(path.as_str()) {
            // No receivers is fine
            let _ = sender.send(document);
        }
    }

    fn take_write_failure(&self) -> bool {
        self.inner
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch(&self, path: &DocumentPath) -> Result<Option<Value>, RemoteError> {
        if self.inner.failing_fetches.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable(format!("fetch {path}")));
        }
        Ok(self.get(path))
    }

    async fn write(&self, path: &DocumentPath, document: Value) -> Result<(), RemoteError> {
        if self.take_write_failure() {
            return Err(RemoteError::Unavailable(format!("write {path}")));
        }
        self.accept(path, document);
        Ok(())
    }

    async fn subscribe(&self, path: &DocumentPath) -> Result<Subscription, RemoteError> {
        let receiver = self
            .inner
            .channels
            .lock()
            .entry(path.to_string())
            .or_insert_with(|| broadcast::channel(self.inner.buffer).0)
            .subscribe();

        let path = path.to_string();
        let stream = futures::stream::unfold(receiver, move |mut receiver| {
            let path = path.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(document) => return Some((document, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(%path, skipped, "notification subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use soullink_model::TrackerId;

    fn path(id: &str) -> DocumentPath {
        DocumentPath::for_tracker("trackers", &TrackerId::new(id).unwrap())
    }

    #[tokio::test]
    async fn fetch_absent_then_present() {
        let store = InMemoryRemoteStore::default();
        let p = path("a");
        assert_eq!(store.fetch(&p).await.unwrap(), None);

        store.write(&p, json!({ "rules": [] })).await.unwrap();
        assert_eq!(store.fetch(&p).await.unwrap(), Some(json!({ "rules": [] })));
        assert_eq!(store.write_count(&p), 1);
    }

    #[tokio::test]
    async fn writer_is_notified() {
        let store = InMemoryRemoteStore::default();
        let p = path("a");
        let mut sub = store.subscribe(&p).await.unwrap();

        store.write(&p, json!(1)).await.unwrap();
        store.put(&path("b"), json!(2));
        store.write(&p, json!(3)).await.unwrap();

        assert_eq!(sub.next().await, Some(json!(1)));
        assert_eq!(sub.next().await, Some(json!(3)));
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let store = InMemoryRemoteStore::default();
        let p = path("a");
        let sub = store.subscribe(&p).await.unwrap();
        assert_eq!(store.subscriber_count(&p), 1);

        drop(sub);
        assert_eq!(store.subscriber_count(&p), 0);
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = InMemoryRemoteStore::default();
        let p = path("a");

        store.fail_next_writes(2);
        assert!(store.write(&p, json!(1)).await.unwrap_err().is_retryable());
        assert!(store.write(&p, json!(1)).await.is_err());
        assert!(store.write(&p, json!(1)).await.is_ok());

        store.fail_fetches(true);
        assert!(store.fetch(&p).await.is_err());
        store.fail_fetches(false);
        assert!(store.fetch(&p).await.unwrap().is_some());
    }
}
