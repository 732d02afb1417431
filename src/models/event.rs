use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Fixed catalog of event categories
pub const CATEGORIES: [&str; 10] = [
    "Muzică",
    "Artă",
    "Sport",
    "Tech",
    "Food & Drinks",
    "Outdoor",
    "Wellness",
    "Educație",
    "Networking",
    "Charity",
];

/// A community event record
///
/// Stored as a JSON document at `events/{id}`. The id doubles as the store
/// key; documents keep a copy so a loaded value is self-describing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: NaiveDate,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// User-submitted event fields, shared by create and edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EventDraft {
    /// Validates required fields and the category against the fixed catalog
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty()
            || self.description.trim().is_empty()
            || self.location.trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "Completează toate câmpurile obligatorii".to_string(),
            ));
        }
        if !CATEGORIES.contains(&self.category.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Categorie necunoscută: {}",
                self.category
            )));
        }
        Ok(())
    }

    /// Normalizes the tag list: trims entries and drops empties
    pub fn clean_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A user's expressed interest in an event
///
/// Keyed by (event, user); presence is the signal, the fields are
/// denormalized display data for the roster view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterestMark {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

/// Extracts the numeric suffix of an `event{N}` id
///
/// Catalog order is ascending by this number; ids are assigned by
/// incrementing the highest suffix found (not atomic, see the catalog
/// adapter).
pub fn numeric_suffix(event_id: &str) -> Option<u64> {
    event_id.strip_prefix("event")?.parse().ok()
}
