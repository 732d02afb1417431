use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::error::AppResult;
use crate::models::{ProfileDraft, UserProfile, UserRecord};
use crate::store::{paths, KeyedStore};

/// Preference-profile adapter over the keyed store
pub struct ProfileStore {
    store: Arc<dyn KeyedStore>,
}

impl ProfileStore {
    pub fn new(store: Arc<dyn KeyedStore>) -> Self {
        Self { store }
    }

    /// Reads the questionnaire profile, `None` when never completed
    pub async fn get_profile(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        match self.store.get(&paths::profile(uid)).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Writes the questionnaire profile as a full overwrite
    ///
    /// Resubmission replaces the whole document; fields are never merged.
    pub async fn put_profile(&self, uid: &str, draft: ProfileDraft) -> AppResult<UserProfile> {
        let profile = draft.into_profile(Utc::now());
        self.store
            .set(&paths::profile(uid), serde_json::to_value(&profile)?)
            .await?;
        tracing::info!(uid = %uid, "Profile saved");
        Ok(profile)
    }

    /// Interaction history: arbitrary structured data, `{}` when absent
    pub async fn get_interactions(&self, uid: &str) -> AppResult<Value> {
        Ok(self
            .store
            .get(&paths::interactions(uid))
            .await?
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    /// Account record for display data (name, email)
    pub async fn get_user(&self, uid: &str) -> AppResult<Option<UserRecord>> {
        match self.store.get(&paths::user(uid)).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }
}
