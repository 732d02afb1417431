use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::models::{numeric_suffix, Event, EventDraft, InterestMark, UserRecord};
use crate::store::{paths, KeyedStore, Subscription};

/// Event-catalog adapter over the keyed store
///
/// Catalog order is ascending by the numeric id suffix, which makes the
/// "first N matches" of the recommendation pipeline deterministic.
pub struct EventCatalog {
    store: Arc<dyn KeyedStore>,
}

impl EventCatalog {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self { store }
    }

    /// Loads the full catalog in catalog order
    pub async fn list(&self) -> AppResult<Vec<Event>> {
        let mut events = Vec::new();
        for (path, doc) in self.store.list(paths::EVENTS).await? {
            let mut event: Event = serde_json::from_value(doc)?;
            // The key is authoritative for the id.
            event.id = path.strip_prefix(paths::EVENTS).unwrap_or(&path).to_string();
            events.push(event);
        }
        events.sort_by_key(|e| numeric_suffix(&e.id).unwrap_or(u64::MAX));
        Ok(events)
    }

    pub async fn get(&self, event_id: &str) -> AppResult<Option<Event>> {
        match self.store.get(&paths::event(event_id)).await? {
            Some(doc) => {
                let mut event: Event = serde_json::from_value(doc)?;
                event.id = event_id.to_string();
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    /// Creates an event with the next sequential id
    ///
    /// The id comes from scanning existing keys and incrementing the highest
    /// numeric suffix. Two concurrent creators can compute the same id and
    /// the second write wins; known race, kept from the original design.
    pub async fn create(&self, uid: &str, draft: EventDraft) -> AppResult<Event> {
        draft.validate()?;

        let next = self
            .store
            .list(paths::EVENTS)
            .await?
            .iter()
            .filter_map(|(path, _)| numeric_suffix(path.strip_prefix(paths::EVENTS)?))
            .max()
            .map_or(1, |n| n + 1);
        let event_id = format!("event{}", next);

        let event = Event {
            id: event_id.clone(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            category: draft.category.clone(),
            date: draft.date,
            location: draft.location.trim().to_string(),
            image_url: draft.image_url.clone().filter(|u| !u.trim().is_empty()),
            tags: draft.clean_tags(),
            creator_id: uid.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.store
            .set(&paths::event(&event_id), serde_json::to_value(&event)?)
            .await?;

        tracing::info!(event_id = %event_id, creator = %uid, "Event created");
        Ok(event)
    }

    /// Updates an event; creator-only
    pub async fn update(&self, uid: &str, event_id: &str, draft: EventDraft) -> AppResult<Event> {
        draft.validate()?;
        let existing = self.require_owned(uid, event_id).await?;

        let event = Event {
            id: existing.id,
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            category: draft.category.clone(),
            date: draft.date,
            location: draft.location.trim().to_string(),
            image_url: draft.image_url.clone().filter(|u| !u.trim().is_empty()),
            tags: draft.clean_tags(),
            creator_id: existing.creator_id,
            created_at: existing.created_at,
            updated_at: Some(Utc::now()),
        };
        self.store
            .set(&paths::event(event_id), serde_json::to_value(&event)?)
            .await?;

        tracing::info!(event_id = %event_id, "Event updated");
        Ok(event)
    }

    /// Deletes an event; creator-only
    ///
    /// Interest marks under the event are left behind; orphaned marks are an
    /// accepted inconsistency.
    pub async fn delete(&self, uid: &str, event_id: &str) -> AppResult<()> {
        self.require_owned(uid, event_id).await?;
        self.store.remove(&paths::event(event_id)).await?;
        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }

    /// Toggles the caller's interest mark; returns the resulting state
    ///
    /// Last-write-wins on the presence key; two concurrent toggles by the
    /// same user are not guarded against.
    pub async fn toggle_interest(&self, uid: &str, event_id: &str) -> AppResult<bool> {
        let event = self
            .get(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Acest eveniment nu mai există.".to_string()))?;
        if event.creator_id == uid {
            return Err(AppError::Forbidden(
                "Nu poți marca interes pentru propriul eveniment".to_string(),
            ));
        }

        let mark_path = paths::interest(event_id, uid);
        if self.store.get(&mark_path).await?.is_some() {
            self.store.remove(&mark_path).await?;
            Ok(false)
        } else {
            let user: Option<UserRecord> = match self.store.get(&paths::user(uid)).await? {
                Some(doc) => Some(serde_json::from_value(doc)?),
                None => None,
            };
            let mark = InterestMark {
                name: user.as_ref().map_or("Utilizator".to_string(), |u| u.name.clone()),
                email: user.map_or_else(String::new, |u| u.email),
                timestamp: Utc::now(),
            };
            self.store.set(&mark_path, serde_json::to_value(&mark)?).await?;
            Ok(true)
        }
    }

    /// Current interest roster for an event, keyed by user id
    pub async fn interested_users(
        &self,
        event_id: &str,
    ) -> AppResult<BTreeMap<String, InterestMark>> {
        let prefix = paths::interest_prefix(event_id);
        let mut roster = BTreeMap::new();
        for (path, doc) in self.store.list(&prefix).await? {
            let uid = path.strip_prefix(&prefix).unwrap_or(&path).to_string();
            roster.insert(uid, serde_json::from_value(doc)?);
        }
        Ok(roster)
    }

    /// Live view over one event's interest roster
    ///
    /// Every notification re-reads and yields the full roster, so consumers
    /// replace their state idempotently. Dropping the watch unsubscribes.
    pub async fn watch_interest(&self, event_id: &str) -> AppResult<InterestWatch> {
        let sub = self
            .store
            .subscribe(&paths::interest_prefix(event_id))
            .await?;
        Ok(InterestWatch {
            event_id: event_id.to_string(),
            store: self.store.clone(),
            sub,
        })
    }

    /// Events created by a user, catalog order
    pub async fn events_created_by(&self, uid: &str) -> AppResult<Vec<Event>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|e| e.creator_id == uid)
            .collect())
    }

    /// Events a user has marked interest in, catalog order
    pub async fn events_interesting_to(&self, uid: &str) -> AppResult<Vec<Event>> {
        let mut out = Vec::new();
        for event in self.list().await? {
            if self
                .store
                .get(&paths::interest(&event.id, uid))
                .await?
                .is_some()
            {
                out.push(event);
            }
        }
        Ok(out)
    }

    async fn require_owned(&self, uid: &str, event_id: &str) -> AppResult<Event> {
        let event = self
            .get(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Acest eveniment nu mai există.".to_string()))?;
        if event.creator_id != uid {
            return Err(AppError::Forbidden(
                "Doar creatorul poate modifica acest eveniment".to_string(),
            ));
        }
        Ok(event)
    }
}

/// Cancellable subscription to one event's interest roster
pub struct InterestWatch {
    event_id: String,
    store: Arc<dyn KeyedStore>,
    sub: Subscription,
}

impl InterestWatch {
    /// Current roster snapshot
    pub async fn roster(&self) -> AppResult<BTreeMap<String, InterestMark>> {
        let prefix = paths::interest_prefix(&self.event_id);
        let mut roster = BTreeMap::new();
        for (path, doc) in self.store.list(&prefix).await? {
            let uid = path.strip_prefix(&prefix).unwrap_or(&path).to_string();
            roster.insert(uid, serde_json::from_value(doc)?);
        }
        Ok(roster)
    }

    /// Waits for the next change and yields the full replaced roster;
    /// `None` once the store side is gone
    pub async fn changed(&mut self) -> Option<AppResult<BTreeMap<String, InterestMark>>> {
        self.sub.next().await?;
        Some(self.roster().await)
    }
}
