use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{CancelGuard, KeyedStore, StoreChange, Subscription};
use crate::error::{AppError, AppResult};

/// Pub/sub channel carrying change notifications for all writes
const CHANGES_CHANNEL: &str = "eventura:changes";

/// Redis-backed keyed store
///
/// Each document path is a Redis key holding the JSON-serialized value.
/// Change notifications are app-level: every mutation publishes the new
/// document on a shared channel, and subscriptions filter by path prefix.
/// `JSON null` on the channel marks a deletion; documents themselves are
/// always objects.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis and establishes the managed connection
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, conn })
    }

    async fn publish(&self, path: &str, value: Option<&Value>) -> AppResult<()> {
        let payload = serde_json::to_string(&serde_json::json!({
            "path": path,
            "value": value,
        }))?;
        let mut conn = self.conn.clone();
        let _: () = conn.publish(CHANGES_CHANNEL, payload).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyedStore for RedisStore {
    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(path).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, path: &str, value: Value) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(path, serde_json::to_string(&value)?).await?;
        self.publish(path, Some(&value)).await
    }

    async fn patch(&self, path: &str, partial: Value) -> AppResult<()> {
        // Read-modify-write; not atomic, matching the store contract.
        let merged = match (self.get(path).await?, &partial) {
            (Some(Value::Object(mut existing)), Value::Object(update)) => {
                for (k, v) in update {
                    existing.insert(k.clone(), v.clone());
                }
                Value::Object(existing)
            }
            _ => partial,
        };
        self.set(path, merged).await
    }

    async fn remove(&self, path: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(path).await?;
        if removed > 0 {
            self.publish(path, None).await?;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<(String, Value)>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = conn.scan_match::<_, String>(&pattern).await?;
            while let Some(key) = iter.next_item().await {
                if !key[prefix.len()..].contains('/') {
                    keys.push(key);
                }
            }
        }
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let raw: Option<String> = conn.get(&key).await?;
            if let Some(json) = raw {
                entries.push((key, serde_json::from_str(&json)?));
            }
        }
        Ok(entries)
    }

    async fn subscribe(&self, prefix: &str) -> AppResult<Subscription> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(AppError::Store)?;
        pubsub.subscribe(CHANGES_CHANNEL).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let prefix = prefix.to_string();

        let task = tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = tokio_stream::StreamExt::next(&mut stream).await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed pub/sub payload");
                        continue;
                    }
                };
                let parsed: Value = match serde_json::from_str(&payload) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed pub/sub payload");
                        continue;
                    }
                };
                let path = parsed["path"].as_str().unwrap_or_default().to_string();
                if !path.starts_with(&prefix) {
                    continue;
                }
                let value = match &parsed["value"] {
                    Value::Null => None,
                    v => Some(v.clone()),
                };
                if tx.send(StoreChange { path, value }).is_err() {
                    break;
                }
            }
        });

        let guard = CancelGuard::new(move || task.abort());
        Ok(Subscription::new(rx, guard))
    }
}
