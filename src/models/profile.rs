use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Psychosocial category from the questionnaire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PsychosocialProfile {
    Explorer,
    Social,
    Creative,
    Active,
    Learner,
}

/// A user's preference profile, written on questionnaire submission
///
/// Stored at `users/{uid}/profile` and fully overwritten on every
/// resubmission; never partially merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub interests: Vec<String>,
    pub preferred_activities: Vec<String>,
    pub psychosocial_profile: PsychosocialProfile,
    pub location: String,
    pub completed_at: DateTime<Utc>,
}

/// Questionnaire submission payload; `completed_at` is stamped server-side
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub interests: Vec<String>,
    pub preferred_activities: Vec<String>,
    pub psychosocial_profile: PsychosocialProfile,
    pub location: String,
}

impl ProfileDraft {
    pub fn into_profile(self, completed_at: DateTime<Utc>) -> UserProfile {
        UserProfile {
            interests: self.interests,
            preferred_activities: self.preferred_activities,
            psychosocial_profile: self.psychosocial_profile,
            location: self.location,
            completed_at,
        }
    }
}

/// Account record at `users/{uid}`
///
/// The password hash lives here because the store is the identity backend;
/// API responses never serialize this type directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
