//! Persistence for `TrainingProgress`.
//!
//! Writes are optimistic: every row carries a `revision`, and a save only
//! lands when the stored revision still matches the one that was read. A
//! concurrent writer therefore loses with `CONCURRENT_UPDATE` instead of
//! silently overwriting another request's transition.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::training::TrainingProgressRow;
use crate::models::user::find_user;
use crate::training::oracle::TaskPayload;
use crate::training::progression::TrainingProgress;

const PROGRESS_COLUMNS: &str = "user_id, phase, day, day_status, current_task, \
    submission_text, feedback, revision";

/// Storage boundary for training records.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fetches the user's progress, creating the initial record on first use.
    /// Fails `NotFound` for an unknown user.
    async fn ensure_progress(&self, user_id: Uuid) -> Result<TrainingProgress, AppError>;

    /// Saves a mutated record if nobody else wrote it since it was read.
    /// On success `progress.revision` is bumped to the stored value.
    async fn commit_progress(&self, progress: &mut TrainingProgress) -> Result<(), AppError>;
}

fn concurrent_update() -> AppError {
    AppError::InvalidState(
        "CONCURRENT_UPDATE",
        "Training progress was changed by another request; reload and retry".to_string(),
    )
}

#[derive(Clone)]
pub struct PgProgressStore {
    pool: PgPool,
}

impl PgProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn ensure_progress(&self, user_id: Uuid) -> Result<TrainingProgress, AppError> {
        if find_user(&self.pool, user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }

        let initial = TrainingProgress::new(user_id);
        let inserted = sqlx::query(
            r#"
            INSERT INTO training_progress (user_id, phase, day, day_status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(initial.phase.as_str())
        .bind(initial.day as i32)
        .bind(initial.day_status.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!("Created training progress for user {user_id}");
        }

        let query = format!("SELECT {PROGRESS_COLUMNS} FROM training_progress WHERE user_id = $1");
        let row = sqlx::query_as::<_, TrainingProgressRow>(&query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(progress_from_row(row)?)
    }

    async fn commit_progress(&self, progress: &mut TrainingProgress) -> Result<(), AppError> {
        let current_task = progress
            .current_task
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to serialize current task")?;

        let updated = sqlx::query(
            r#"
            UPDATE training_progress
            SET phase = $3,
                day = $4,
                day_status = $5,
                current_task = $6,
                submission_text = $7,
                feedback = $8,
                revision = revision + 1,
                updated_at = now()
            WHERE user_id = $1 AND revision = $2
            "#,
        )
        .bind(progress.user_id)
        .bind(progress.revision)
        .bind(progress.phase.as_str())
        .bind(progress.day as i32)
        .bind(progress.day_status.as_str())
        .bind(current_task)
        .bind(progress.submission_text.as_deref())
        .bind(progress.feedback.as_deref())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(concurrent_update());
        }

        progress.revision += 1;
        Ok(())
    }
}

fn progress_from_row(row: TrainingProgressRow) -> anyhow::Result<TrainingProgress> {
    let current_task = row
        .current_task
        .map(serde_json::from_value::<TaskPayload>)
        .transpose()
        .with_context(|| format!("Stored task for user {} is not a task payload", row.user_id))?;

    let day = u32::try_from(row.day)
        .ok()
        .filter(|d| *d >= 1)
        .ok_or_else(|| anyhow!("Stored day {} for user {} is not positive", row.day, row.user_id))?;

    Ok(TrainingProgress {
        user_id: row.user_id,
        phase: row.phase.parse()?,
        day,
        day_status: row.day_status.parse()?,
        current_task,
        submission_text: row.submission_text,
        feedback: row.feedback,
        revision: row.revision,
    })
}
