use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

use super::{CancelGuard, KeyedStore, StoreChange, Subscription};
use crate::error::AppResult;

/// In-process keyed store
///
/// Default backend for development and tests. Documents live in a sorted
/// map; subscribers are notified synchronously after each mutation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    docs: RwLock<BTreeMap<String, Value>>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_sub_id: AtomicU64,
}

struct Subscriber {
    prefix: String,
    tx: mpsc::UnboundedSender<StoreChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, path: &str, value: Option<Value>) {
        let subscribers = self.inner.subscribers.lock().expect("subscriber lock poisoned");
        for sub in subscribers.values() {
            if path.starts_with(&sub.prefix) {
                // A closed receiver just means the watcher is gone; the
                // entry is removed by its guard.
                let _ = sub.tx.send(StoreChange {
                    path: path.to_string(),
                    value: value.clone(),
                });
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyedStore for MemoryStore {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        Ok(self.inner.docs.read().await.get(path).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> AppResult<()> {
        self.inner
            .docs
            .write()
            .await
            .insert(path.to_string(), value.clone());
        self.notify(path, Some(value));
        Ok(())
    }

    async fn patch(&self, path: &str, partial: Value) -> AppResult<()> {
        let merged = {
            let mut docs = self.inner.docs.write().await;
            let merged = match (docs.get(path), &partial) {
                (Some(Value::Object(existing)), Value::Object(update)) => {
                    let mut merged = existing.clone();
                    for (k, v) in update {
                        merged.insert(k.clone(), v.clone());
                    }
                    Value::Object(merged)
                }
                _ => partial,
            };
            docs.insert(path.to_string(), merged.clone());
            merged
        };
        self.notify(path, Some(merged));
        Ok(())
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        let removed = self.inner.docs.write().await.remove(path);
        if removed.is_some() {
            self.notify(path, None);
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<(String, Value)>> {
        let docs = self.inner.docs.read().await;
        let entries = docs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(entries)
    }

    async fn subscribe(&self, prefix: &str) -> AppResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_sub_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .insert(
                id,
                Subscriber {
                    prefix: prefix.to_string(),
                    tx,
                },
            );

        let inner = self.inner.clone();
        let guard = CancelGuard::new(move || {
            inner
                .subscribers
                .lock()
                .expect("subscriber lock poisoned")
                .remove(&id);
        });

        Ok(Subscription::new(rx, guard))
    }
}
