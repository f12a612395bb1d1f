//! Axum route handlers for the Mentorship and Guide APIs.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::mentorship::chat::{list_messages, send_message};
use crate::mentorship::expertise::{offered_requests, ExpertiseSet};
use crate::mentorship::lifecycle::accept;
use crate::mentorship::request::MentorshipRequest;
use crate::mentorship::store::NewRequest;
use crate::models::mentorship::{ChatMessageRow, ChatSessionRow};
use crate::models::user::{find_user, User};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub user_id: Uuid,
    pub field: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
    pub guide_id: Uuid,
    pub request_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct OnboardBody {
    pub user_id: Uuid,
    pub expertise_fields: Vec<String>,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GuideStatusResponse {
    pub is_onboarded: bool,
    pub expertise: Vec<String>,
    pub linkedin_url: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/mentorship/requests
pub async fn handle_create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<MentorshipRequest>), AppError> {
    if body.field.trim().is_empty() {
        return Err(AppError::Validation("field cannot be empty".to_string()));
    }
    if body.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    require_user(&state, body.user_id).await?;

    let request = state
        .mentorship
        .create_request(NewRequest {
            explorer_id: body.user_id,
            field: &body.field,
            title: &body.title,
            description: &body.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/mentorship/available
///
/// Open requests the guide's expertise covers, oldest first. Users without a
/// guide profile get an empty list rather than an error.
pub async fn handle_available_requests(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<MentorshipRequest>>, AppError> {
    let profile = state.mentorship.find_guide_profile(params.user_id).await?;
    let open = match profile {
        Some(_) => state.mentorship.list_open_requests().await?,
        None => Vec::new(),
    };

    let fields = profile.as_ref().map(|p| p.expertise_fields.as_slice());
    Ok(Json(offered_requests(fields, &open)))
}

/// POST /api/v1/mentorship/accept
///
/// First guide to accept an open request wins; everyone else gets REQUEST_NOT_OPEN.
pub async fn handle_accept(
    State(state): State<AppState>,
    Json(body): Json<AcceptBody>,
) -> Result<Json<ChatSessionRow>, AppError> {
    let session = accept(&state.mentorship, body.request_id, body.guide_id).await?;
    Ok(Json(session))
}

/// GET /api/v1/chat/sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ChatSessionRow>>, AppError> {
    require_user(&state, params.user_id).await?;
    let sessions = state.mentorship.list_sessions_for_user(params.user_id).await?;
    Ok(Json(sessions))
}

/// POST /api/v1/chat/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ChatMessageRow>), AppError> {
    if body.content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let message = send_message(
        &state.mentorship,
        body.session_id,
        body.sender_id,
        &body.content,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/v1/chat/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> Result<Json<Vec<ChatMessageRow>>, AppError> {
    let messages = list_messages(&state.mentorship, params.session_id).await?;
    Ok(Json(messages))
}

/// POST /api/v1/guides/onboard
///
/// Replaces the guide's declared expertise with the normalized set given.
pub async fn handle_guide_onboard(
    State(state): State<AppState>,
    Json(body): Json<OnboardBody>,
) -> Result<Json<GuideStatusResponse>, AppError> {
    let user = require_user(&state, body.user_id).await?;
    if !user.is_guide() {
        return Err(AppError::Validation(
            "Only guide accounts can declare expertise".to_string(),
        ));
    }

    let expertise: ExpertiseSet = body.expertise_fields.iter().collect();
    if expertise.is_empty() {
        return Err(AppError::Validation(
            "expertise_fields must contain at least one field".to_string(),
        ));
    }

    let linkedin_url = body
        .linkedin_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let profile = state
        .mentorship
        .save_guide_expertise(user.id, &expertise, linkedin_url)
        .await?;

    Ok(Json(GuideStatusResponse {
        is_onboarded: profile.is_onboarded,
        expertise: profile.expertise_fields,
        linkedin_url: profile.linkedin_url,
    }))
}

/// GET /api/v1/guides/status
pub async fn handle_guide_status(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<GuideStatusResponse>, AppError> {
    require_user(&state, params.user_id).await?;

    let response = match state.mentorship.find_guide_profile(params.user_id).await? {
        Some(profile) => GuideStatusResponse {
            is_onboarded: profile.is_onboarded,
            expertise: profile.expertise_fields,
            linkedin_url: profile.linkedin_url,
        },
        None => GuideStatusResponse {
            is_onboarded: false,
            expertise: Vec::new(),
            linkedin_url: None,
        },
    };
    Ok(Json(response))
}

async fn require_user(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    find_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}
