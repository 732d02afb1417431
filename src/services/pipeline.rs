use std::sync::Arc;

use serde::Serialize;

use crate::error::AppResult;
use crate::models::Event;
use crate::services::events::EventCatalog;
use crate::services::profiles::ProfileStore;
use crate::services::recommender::Recommender;
use crate::services::relevance;

/// Maximum events on the "for you" view
const RECOMMENDATION_LIMIT: usize = 6;

/// Threshold above which an event gets the "recomandat" badge
const BADGE_THRESHOLD: u32 = 5;

/// An event annotated with its relevance score
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEvent {
    #[serde(flatten)]
    pub event: Event,
    pub relevance_score: u32,
    pub recommended: bool,
}

/// Recommendation pipeline: profile → keywords → catalog → filter → rank
///
/// Two deliberately separate paths: the baseline "for you" filter is pure
/// substring containment in catalog order, and the AI-keyword scoring is an
/// optional enrichment layered on top of it. Each step reads its own store
/// snapshot; there is no consistency guarantee across steps.
pub struct Pipeline {
    profiles: Arc<ProfileStore>,
    catalog: Arc<EventCatalog>,
    recommender: Arc<Recommender>,
}

impl Pipeline {
    pub fn new(
        profiles: Arc<ProfileStore>,
        catalog: Arc<EventCatalog>,
        recommender: Arc<Recommender>,
    ) -> Self {
        Self {
            profiles,
            catalog,
            recommender,
        }
    }

    /// Baseline "for you" recommendations: at most 6 events, catalog order
    ///
    /// Empty result when the profile is absent or lacks location/interests;
    /// both are valid non-error outcomes (the caller prompts for the
    /// questionnaire).
    pub async fn recommend(&self, uid: &str) -> AppResult<Vec<Event>> {
        let Some(profile) = self.profiles.get_profile(uid).await? else {
            return Ok(Vec::new());
        };
        if profile.location.trim().is_empty() || profile.interests.is_empty() {
            return Ok(Vec::new());
        }

        let location = profile.location.to_lowercase();
        let interests: Vec<String> = profile.interests.iter().map(|i| i.to_lowercase()).collect();

        let matches = self
            .catalog
            .list()
            .await?
            .into_iter()
            .filter(|event| {
                event.location.to_lowercase().contains(&location)
                    && interests.iter().any(|interest| {
                        event.category.to_lowercase().contains(interest)
                            || event
                                .tags
                                .iter()
                                .any(|tag| tag.to_lowercase().contains(interest))
                    })
            })
            .take(RECOMMENDATION_LIMIT)
            .collect();

        Ok(matches)
    }

    /// AI-enriched view: baseline matches scored against generated keywords
    ///
    /// Keywords are lowercased here before scoring, so the generator's
    /// verbatim fallback still meets the scorer's case contract. Ordered by
    /// score descending; equal scores keep catalog order (stable sort).
    pub async fn recommend_ranked(&self, uid: &str) -> AppResult<Vec<ScoredEvent>> {
        let Some(profile) = self.profiles.get_profile(uid).await? else {
            return Ok(Vec::new());
        };
        let baseline = self.recommend(uid).await?;
        if baseline.is_empty() {
            return Ok(Vec::new());
        }

        let keywords: Vec<String> = self
            .recommender
            .generate(uid, &profile)
            .await
            .iter()
            .map(|k| k.to_lowercase())
            .collect();

        let mut scored: Vec<ScoredEvent> = baseline
            .into_iter()
            .map(|event| {
                let relevance_score = relevance::score(&event, &keywords);
                ScoredEvent {
                    event,
                    relevance_score,
                    recommended: relevance_score > BADGE_THRESHOLD,
                }
            })
            .collect();
        scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

        Ok(scored)
    }

    /// Free-text search over the whole catalog, newest event date first
    ///
    /// Case-insensitive substring match across title, category, location,
    /// tags and description; a blank query returns everything.
    pub async fn search(&self, query: &str) -> AppResult<Vec<Event>> {
        let mut events = self.catalog.list().await?;
        events.sort_by(|a, b| b.date.cmp(&a.date));

        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(events);
        }

        Ok(events
            .into_iter()
            .filter(|event| {
                event.title.to_lowercase().contains(&query)
                    || event.category.to_lowercase().contains(&query)
                    || event.location.to_lowercase().contains(&query)
                    || event.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
                    || event.description.to_lowercase().contains(&query)
            })
            .collect())
    }
}
