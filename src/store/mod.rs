use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::AppResult;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

/// Keyed JSON document store abstraction
///
/// Paths are slash-separated (`users/{uid}/profile`, `events/{id}`). Each
/// path holds one JSON document; `list` enumerates immediate children of a
/// prefix, and `subscribe` delivers change notifications for a subtree until
/// the returned handle is dropped.
///
/// No operation is transactional. Writes are full overwrites except `patch`,
/// which merges top-level object keys. Readers may observe any interleaving
/// of concurrent writes (eventual consistency, not snapshots).
#[async_trait::async_trait]
pub trait KeyedStore: Send + Sync {
    /// Reads the document at `path`, `None` when absent
    async fn get(&self, path: &str) -> AppResult<Option<Value>>;

    /// Writes the document at `path`, overwriting any existing value
    async fn set(&self, path: &str, value: Value) -> AppResult<()>;

    /// Merges `partial`'s top-level keys into the document at `path`
    ///
    /// When the existing document is absent or not an object, behaves
    /// like `set`.
    async fn patch(&self, path: &str, partial: Value) -> AppResult<()>;

    /// Deletes the document at `path`; deleting an absent path is a no-op
    async fn remove(&self, path: &str) -> AppResult<()>;

    /// Lists immediate children of `prefix` as `(path, value)` pairs,
    /// sorted by path
    ///
    /// `prefix` must end with `/`. A key is an immediate child when the
    /// remainder after the prefix contains no further `/`.
    async fn list(&self, prefix: &str) -> AppResult<Vec<(String, Value)>>;

    /// Subscribes to changes under `prefix` (subtree match)
    ///
    /// The subscription is released when the handle is dropped.
    async fn subscribe(&self, prefix: &str) -> AppResult<Subscription>;
}

/// A single change notification: the affected path and its new value
/// (`None` on delete)
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub path: String,
    pub value: Option<Value>,
}

/// Cancellable live-change subscription
///
/// Dropping the handle releases the underlying resources (subscriber
/// registration or pub/sub task), so holders get scoped teardown for free.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StoreChange>,
    _guard: CancelGuard,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<StoreChange>, guard: CancelGuard) -> Self {
        Self { rx, _guard: guard }
    }

    /// Waits for the next change; `None` once the store side is gone
    pub async fn next(&mut self) -> Option<StoreChange> {
        self.rx.recv().await
    }
}

/// Runs a cleanup closure when dropped
pub(crate) struct CancelGuard {
    on_drop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CancelGuard {
    pub(crate) fn new(on_drop: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            on_drop: Some(Box::new(on_drop)),
        }
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(f) = self.on_drop.take() {
            f();
        }
    }
}

/// Store paths used by the application
pub mod paths {
    pub fn user(uid: &str) -> String {
        format!("users/{}", uid)
    }

    pub fn profile(uid: &str) -> String {
        format!("users/{}/profile", uid)
    }

    pub fn interactions(uid: &str) -> String {
        format!("users/{}/interactions", uid)
    }

    pub fn event(event_id: &str) -> String {
        format!("events/{}", event_id)
    }

    pub fn interest(event_id: &str, uid: &str) -> String {
        format!("events/{}/interestedUsers/{}", event_id, uid)
    }

    pub fn interest_prefix(event_id: &str) -> String {
        format!("events/{}/interestedUsers/", event_id)
    }

    pub fn session(token: &str) -> String {
        format!("sessions/{}", token)
    }

    pub const USERS: &str = "users/";
    pub const EVENTS: &str = "events/";
    pub const SESSIONS: &str = "sessions/";
}
