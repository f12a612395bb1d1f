//! PostgreSQL repository for requests, guide profiles and chat sessions.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::mentorship::chat::ChatStore;
use crate::mentorship::expertise::ExpertiseSet;
use crate::mentorship::lifecycle::MentorshipStore;
use crate::mentorship::request::{MentorshipRequest, RequestStatus};
use crate::models::mentorship::{
    ChatMessageRow, ChatSessionRow, GuideProfileRow, MentorshipRequestRow,
};
use crate::models::user::ROLE_GUIDE;

const REQUEST_COLUMNS: &str = "id, explorer_id, field, title, description, status, created_at";
const SESSION_COLUMNS: &str = "id, request_id, explorer_id, guide_id, created_at";
const MESSAGE_COLUMNS: &str = "id, session_id, sender_id, content, created_at";
const PROFILE_COLUMNS: &str =
    "user_id, expertise_fields, linkedin_url, is_onboarded, created_at, updated_at";

/// Fields of a request as submitted by the explorer.
pub struct NewRequest<'a> {
    pub explorer_id: Uuid,
    pub field: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Clone)]
pub struct PgMentorshipStore {
    pool: PgPool,
}

impl PgMentorshipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_request(&self, new: NewRequest<'_>) -> anyhow::Result<MentorshipRequest> {
        let query = format!(
            "INSERT INTO mentorship_requests (id, explorer_id, field, title, description, status) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MentorshipRequestRow>(&query)
            .bind(Uuid::new_v4())
            .bind(new.explorer_id)
            .bind(new.field.trim())
            .bind(new.title.trim())
            .bind(new.description)
            .bind(RequestStatus::Open.as_str())
            .fetch_one(&self.pool)
            .await?;

        info!(
            "Explorer {} opened mentorship request {} ({})",
            row.explorer_id, row.id, row.field
        );
        Ok(MentorshipRequest::try_from(row)?)
    }

    /// All open requests, oldest first.
    pub async fn list_open_requests(&self) -> anyhow::Result<Vec<MentorshipRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM mentorship_requests \
             WHERE status = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, MentorshipRequestRow>(&query)
            .bind(RequestStatus::Open.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| MentorshipRequest::try_from(row).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn find_guide_profile(&self, user_id: Uuid) -> anyhow::Result<Option<GuideProfileRow>> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM guide_profiles WHERE user_id = $1");
        Ok(sqlx::query_as::<_, GuideProfileRow>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Replaces the guide's expertise and marks the profile onboarded.
    pub async fn save_guide_expertise(
        &self,
        user_id: Uuid,
        expertise: &ExpertiseSet,
        linkedin_url: Option<&str>,
    ) -> anyhow::Result<GuideProfileRow> {
        let query = format!(
            "INSERT INTO guide_profiles (user_id, expertise_fields, linkedin_url, is_onboarded) \
             VALUES ($1, $2, $3, TRUE) \
             ON CONFLICT (user_id) DO UPDATE \
             SET expertise_fields = EXCLUDED.expertise_fields, \
                 linkedin_url = EXCLUDED.linkedin_url, \
                 is_onboarded = TRUE, \
                 updated_at = now() \
             RETURNING {PROFILE_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, GuideProfileRow>(&query)
            .bind(user_id)
            .bind(expertise.to_vec())
            .bind(linkedin_url)
            .fetch_one(&self.pool)
            .await?;

        info!(
            "Guide {user_id} onboarded with {} expertise field(s)",
            expertise.len()
        );
        Ok(profile)
    }

    /// Sessions where the user is either the requester or the guide, newest first.
    pub async fn list_sessions_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<ChatSessionRow>> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions \
             WHERE explorer_id = $1 OR guide_id = $1 \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, ChatSessionRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl MentorshipStore for PgMentorshipStore {
    async fn find_request(&self, request_id: Uuid) -> anyhow::Result<Option<MentorshipRequest>> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM mentorship_requests WHERE id = $1");
        let row = sqlx::query_as::<_, MentorshipRequestRow>(&query)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MentorshipRequest::try_from).transpose()?)
    }

    async fn guide_exists(&self, guide_id: Uuid) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND role = $2)")
                .bind(guide_id)
                .bind(ROLE_GUIDE)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn claim_open_request(
        &self,
        request: &MentorshipRequest,
        guide_id: Uuid,
    ) -> anyhow::Result<Option<ChatSessionRow>> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set: only one transaction can see the row still open.
        let claimed: Option<Uuid> = sqlx::query_scalar(
            "UPDATE mentorship_requests SET status = $2 \
             WHERE id = $1 AND status = $3 \
             RETURNING explorer_id",
        )
        .bind(request.id)
        .bind(RequestStatus::Accepted.as_str())
        .bind(RequestStatus::Open.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(explorer_id) = claimed else {
            tx.rollback().await?;
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO chat_sessions (id, request_id, explorer_id, guide_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, ChatSessionRow>(&query)
            .bind(Uuid::new_v4())
            .bind(request.id)
            .bind(explorer_id)
            .bind(guide_id)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to record chat session for accepted request")?;

        tx.commit().await?;
        Ok(Some(session))
    }
}

#[async_trait]
impl ChatStore for PgMentorshipStore {
    async fn find_session(&self, session_id: Uuid) -> anyhow::Result<Option<ChatSessionRow>> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = $1");
        Ok(sqlx::query_as::<_, ChatSessionRow>(&query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_message(
        &self,
        session_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> anyhow::Result<ChatMessageRow> {
        let query = format!(
            "INSERT INTO chat_messages (id, session_id, sender_id, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ChatMessageRow>(&query)
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(sender_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_messages(&self, session_id: Uuid) -> anyhow::Result<Vec<ChatMessageRow>> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages \
             WHERE session_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        Ok(sqlx::query_as::<_, ChatMessageRow>(&query)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
