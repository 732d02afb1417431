use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

use super::extract::CurrentUser;
use super::AppState;
use crate::auth::Session;
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventDraft, InterestMark, ProfileDraft, UserProfile};
use crate::services::ScoredEvent;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InterestResponse {
    pub interested: bool,
}

/// Event detail with the denormalized bits the detail view renders
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: Event,
    pub interested_count: usize,
    pub is_interested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<CreatorInfo>,
}

#[derive(Debug, Serialize)]
pub struct CreatorInfo {
    pub name: String,
    pub location: String,
}

/// Public view of a user: the creator-popup payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    pub created_events: Vec<Event>,
    pub interested_events: Vec<Event>,
}

/// The caller's own account summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    pub created_events: Vec<Event>,
    pub interested_events: Vec<Event>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let session = state
        .auth
        .register(&request.email, &request.password, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Session>> {
    let session = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(session))
}

/// Log out the current session
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> AppResult<StatusCode> {
    state.auth.logout(&user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the caller's questionnaire profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .profiles
        .get_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Chestionarul nu a fost completat".to_string()))?;
    Ok(Json(profile))
}

/// Submit the questionnaire; a resubmission replaces the whole profile
pub async fn put_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(draft): Json<ProfileDraft>,
) -> AppResult<Json<UserProfile>> {
    if draft.interests.is_empty()
        || draft.preferred_activities.is_empty()
        || draft.location.trim().is_empty()
    {
        return Err(AppError::InvalidInput(
            "Completează toate câmpurile obligatorii".to_string(),
        ));
    }
    let profile = state.profiles.put_profile(&user.uid, draft).await?;
    Ok(Json(profile))
}

/// The caller's account plus created and interested events
pub async fn profile_summary(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileSummary>> {
    let record = state
        .profiles
        .get_user(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Utilizator negăsit".to_string()))?;

    Ok(Json(ProfileSummary {
        name: record.name,
        email: record.email,
        profile: state.profiles.get_profile(&user.uid).await?,
        created_events: state.catalog.events_created_by(&user.uid).await?,
        interested_events: state.catalog.events_interesting_to(&user.uid).await?,
    }))
}

/// All events, optionally filtered by a free-text query
pub async fn list_events(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<EventsQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let events = state
        .pipeline
        .search(params.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(events))
}

/// Create a new event
pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(draft): Json<EventDraft>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let event = state.catalog.create(&user.uid, draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Event detail with roster size, caller's interest state and creator info
pub async fn get_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<Json<EventDetailResponse>> {
    let event = state
        .catalog
        .get(&event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Acest eveniment nu mai există.".to_string()))?;

    let roster = state.catalog.interested_users(&event_id).await?;
    let is_interested = roster.contains_key(&user.uid);

    let creator = if event.creator_id == user.uid {
        None
    } else {
        match state.profiles.get_user(&event.creator_id).await? {
            Some(record) => {
                let location = state
                    .profiles
                    .get_profile(&event.creator_id)
                    .await?
                    .map(|p| p.location)
                    .unwrap_or_default();
                Some(CreatorInfo {
                    name: record.name,
                    location,
                })
            }
            None => None,
        }
    };

    Ok(Json(EventDetailResponse {
        event,
        interested_count: roster.len(),
        is_interested,
        creator,
    }))
}

/// Edit an event; creator-only
pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    Json(draft): Json<EventDraft>,
) -> AppResult<Json<Event>> {
    let event = state.catalog.update(&user.uid, &event_id, draft).await?;
    Ok(Json(event))
}

/// Delete an event; creator-only
pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<StatusCode> {
    state.catalog.delete(&user.uid, &event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the caller's interest mark; responds with the resulting state
pub async fn toggle_interest(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<Json<InterestResponse>> {
    let interested = state.catalog.toggle_interest(&user.uid, &event_id).await?;
    Ok(Json(InterestResponse { interested }))
}

/// Interest roster for an event
pub async fn interested_users(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<Json<BTreeMap<String, InterestMark>>> {
    Ok(Json(state.catalog.interested_users(&event_id).await?))
}

/// Live interest roster as server-sent events
///
/// Emits the current roster immediately, then the full replaced roster on
/// every change. The watch (and with it the store subscription) is dropped
/// when the client disconnects.
pub async fn interested_live(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(event_id): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<SseEvent, axum::Error>>>> {
    let mut watch = state.catalog.watch_interest(&event_id).await?;
    let initial = watch.roster().await?;

    let (tx, rx) = mpsc::channel::<BTreeMap<String, InterestMark>>(16);
    tokio::spawn(async move {
        if tx.send(initial).await.is_err() {
            return;
        }
        while let Some(roster) = watch.changed().await {
            match roster {
                Ok(roster) => {
                    if tx.send(roster).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Interest roster refresh failed");
                    break;
                }
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(|roster| SseEvent::default().json_data(&roster));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Baseline "for you" recommendations, at most 6 events
pub async fn recommendations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.pipeline.recommend(&user.uid).await?))
}

/// AI-enriched recommendations with relevance scores and badge flags
pub async fn recommendations_ranked(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<ScoredEvent>>> {
    Ok(Json(state.pipeline.recommend_ranked(&user.uid).await?))
}

/// Public view of another user (the creator popup)
pub async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(uid): Path<String>,
) -> AppResult<Json<UserView>> {
    let record = state
        .profiles
        .get_user(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Utilizator negăsit".to_string()))?;

    Ok(Json(UserView {
        name: record.name,
        profile: state.profiles.get_profile(&uid).await?,
        created_events: state.catalog.events_created_by(&uid).await?,
        interested_events: state.catalog.events_interesting_to(&uid).await?,
    }))
}
