pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::mentorship::handlers as mentorship;
use crate::state::AppState;
use crate::training::handlers as training;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Training API
        .route(
            "/api/v1/training/status",
            get(training::handle_training_status),
        )
        .route("/api/v1/training/task", post(training::handle_start_task))
        .route("/api/v1/training/submit", post(training::handle_submit))
        // Mentorship API
        .route(
            "/api/v1/mentorship/requests",
            post(mentorship::handle_create_request),
        )
        .route(
            "/api/v1/mentorship/available",
            get(mentorship::handle_available_requests),
        )
        .route("/api/v1/mentorship/accept", post(mentorship::handle_accept))
        .route("/api/v1/chat/sessions", get(mentorship::handle_list_sessions))
        .route(
            "/api/v1/chat/messages",
            get(mentorship::handle_list_messages).post(mentorship::handle_send_message),
        )
        // Guide API
        .route(
            "/api/v1/guides/onboard",
            post(mentorship::handle_guide_onboard),
        )
        .route("/api/v1/guides/status", get(mentorship::handle_guide_status))
        .with_state(state)
}
