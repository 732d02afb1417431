use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::UserProfile;
use crate::services::profiles::ProfileStore;

/// External text-generation seam
///
/// One method, free text in and out; everything above it (prompting,
/// parsing, fallback) lives in [`Recommender`] so the transport can be
/// mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> AppResult<String>;
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalApi("Gemini API key not configured".to_string()))?;

        let url = format!("{}?key={}", self.api_url, api_key);
        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self.http_client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Gemini API returned status {}",
                status
            )));
        }

        let data: serde_json::Value = response.json().await?;
        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(text)
    }
}

/// Recommendation keyword generator
///
/// Total: every failure path degrades to the profile's raw interests, so
/// callers never see an error from here. The fallback list is returned
/// verbatim (order and casing as stored); lowercasing happens where the
/// keywords meet the scorer.
pub struct Recommender {
    profiles: Arc<ProfileStore>,
    generator: Arc<dyn TextGenerator>,
}

impl Recommender {
    pub fn new(profiles: Arc<ProfileStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { profiles, generator }
    }

    /// Produces an ordered keyword list for a user
    pub async fn generate(&self, uid: &str, profile: &UserProfile) -> Vec<String> {
        match self.try_generate(uid, profile).await {
            Ok(keywords) => keywords,
            Err(e) => {
                tracing::warn!(uid = %uid, error = %e, "Keyword generation failed, falling back to interests");
                profile.interests.clone()
            }
        }
    }

    async fn try_generate(&self, uid: &str, profile: &UserProfile) -> AppResult<Vec<String>> {
        let interactions = self.profiles.get_interactions(uid).await?;
        let prompt = build_prompt(profile, &interactions);

        let text = self.generator.generate_text(&prompt).await?;
        Ok(parse_keywords(&text))
    }
}

/// Builds the natural-language prompt from the profile and history
fn build_prompt(profile: &UserProfile, interactions: &serde_json::Value) -> String {
    let location = if profile.location.trim().is_empty() {
        "nedefinită"
    } else {
        profile.location.as_str()
    };
    let psychosocial = serde_json::to_value(profile.psychosocial_profile)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default();

    format!(
        "Ești un asistent AI pentru o aplicație comunitară de evenimente.\n\n\
         Profil utilizator:\n\
         - Interese: {}\n\
         - Activități preferate: {}\n\
         - Profil psihosocial: {}\n\
         - Locație: {}\n\n\
         Istoric interacțiuni recente:\n{}\n\n\
         Te rog să generezi o listă de 2-3 categorii sau tag-uri de evenimente \
         care ar fi cele mai relevante pentru acest utilizator.\n\
         Răspunde DOAR cu o listă de cuvinte cheie separate prin virgulă, fără alte explicații.\n\n\
         Exemple de categorii: muzică live, artă, sport, tech, food, outdoor, \
         workshop, networking, charity, wellness",
        profile.interests.join(", "),
        profile.preferred_activities.join(", "),
        psychosocial,
        location,
        serde_json::to_string_pretty(interactions).unwrap_or_else(|_| "{}".to_string()),
    )
}

/// Splits the free-text response into lowercase keywords
///
/// Commas delimit, whitespace is trimmed, empty tokens dropped. An empty
/// response yields an empty list, which is a valid (non-fallback) outcome.
fn parse_keywords(text: &str) -> Vec<String> {
    text.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
