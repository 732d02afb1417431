use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Identity
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        // Profile (questionnaire + own summary)
        .route("/profile", get(handlers::get_profile).put(handlers::put_profile))
        .route("/profile/summary", get(handlers::profile_summary))
        // Event catalog
        .route("/events", get(handlers::list_events).post(handlers::create_event))
        .route(
            "/events/:id",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        .route("/events/:id/interest", post(handlers::toggle_interest))
        .route("/events/:id/interested", get(handlers::interested_users))
        .route("/events/:id/interested/live", get(handlers::interested_live))
        // Recommendations
        .route("/recommendations", get(handlers::recommendations))
        .route("/recommendations/ranked", get(handlers::recommendations_ranked))
        // Other users
        .route("/users/:uid", get(handlers::get_user))
        // request-id middleware sits outside the trace layer so the span
        // can pick the id up from request extensions
        .layer(TraceLayer::new_for_http().make_span_with(request_id::make_span))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
