//! Axum route handlers for the Training API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::training::oracle::TaskPayload;
use crate::training::phase::{DayStatus, Phase};
use crate::training::progression::{start_task, submit, ProgressionError, TrainingProgress};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StartTaskRequest {
    pub user_id: Uuid,
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub user_id: Uuid,
    pub submission_text: String,
}

#[derive(Debug, Serialize)]
pub struct TrainingStatusResponse {
    pub phase: Phase,
    pub day: u32,
    pub day_limit: Option<u32>,
    pub status: DayStatus,
    pub task: Option<TaskPayload>,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartTaskResponse {
    pub task: TaskPayload,
    /// True when the task was already waiting and nothing was generated.
    pub reused: bool,
    pub phase: Phase,
    pub day: u32,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub passed: bool,
    pub feedback: String,
    pub phase: Phase,
    pub day: u32,
    pub day_status: DayStatus,
}

impl From<&TrainingProgress> for TrainingStatusResponse {
    fn from(progress: &TrainingProgress) -> Self {
        Self {
            phase: progress.phase,
            day: progress.day,
            day_limit: progress.phase.day_limit(),
            status: progress.day_status,
            task: progress.current_task.clone(),
            feedback: progress.feedback.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/training/status
///
/// Returns the caller's progress, creating the initial record on first visit.
pub async fn handle_training_status(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TrainingStatusResponse>, AppError> {
    let progress = state.progress.ensure_progress(params.user_id).await?;
    Ok(Json(TrainingStatusResponse::from(&progress)))
}

/// POST /api/v1/training/task
///
/// Generates today's task. Asking again before submitting returns the same task.
pub async fn handle_start_task(
    State(state): State<AppState>,
    Json(request): Json<StartTaskRequest>,
) -> Result<Json<StartTaskResponse>, AppError> {
    let topic = request
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(state.config.training_topic.as_str());

    let mut progress = state.progress.ensure_progress(request.user_id).await?;

    let (task, reused) = match start_task(&mut progress, state.oracle.as_ref(), topic).await {
        Ok(task) => {
            state.progress.commit_progress(&mut progress).await?;
            (task, false)
        }
        Err(ProgressionError::TaskAlreadyActive { task }) => (task, true),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(StartTaskResponse {
        task,
        reused,
        phase: progress.phase,
        day: progress.day,
    }))
}

/// POST /api/v1/training/submit
///
/// Grades the submission for today's task and advances the user on a pass.
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    if request.submission_text.trim().is_empty() {
        return Err(AppError::Validation(
            "submission_text cannot be empty".to_string(),
        ));
    }

    let mut progress = state.progress.ensure_progress(request.user_id).await?;
    let verdict = submit(&mut progress, state.oracle.as_ref(), &request.submission_text).await?;
    state.progress.commit_progress(&mut progress).await?;

    Ok(Json(SubmitResponse {
        passed: verdict.passed,
        feedback: verdict.feedback,
        phase: progress.phase,
        day: progress.day,
        day_status: progress.day_status,
    }))
}
