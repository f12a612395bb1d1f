//! Messages between the explorer and the guide of an accepted request.
//!
//! Only the two participants recorded on the session may post. Messages are
//! append-only and read back oldest first.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::mentorship::{ChatMessageRow, ChatSessionRow};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat session {0} not found")]
    SessionNotFound(Uuid),

    #[error("User {user_id} is not a participant in chat session {session_id}")]
    NotParticipant { session_id: Uuid, user_id: Uuid },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_session(&self, session_id: Uuid) -> anyhow::Result<Option<ChatSessionRow>>;

    async fn insert_message(
        &self,
        session_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> anyhow::Result<ChatMessageRow>;

    /// Oldest first.
    async fn list_messages(&self, session_id: Uuid) -> anyhow::Result<Vec<ChatMessageRow>>;
}

fn is_participant(session: &ChatSessionRow, user_id: Uuid) -> bool {
    session.explorer_id == user_id || session.guide_id == user_id
}

pub async fn send_message(
    store: &dyn ChatStore,
    session_id: Uuid,
    sender_id: Uuid,
    content: &str,
) -> Result<ChatMessageRow, ChatError> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(ChatError::SessionNotFound(session_id))?;

    if !is_participant(&session, sender_id) {
        return Err(ChatError::NotParticipant {
            session_id,
            user_id: sender_id,
        });
    }

    let message = store.insert_message(session_id, sender_id, content).await?;
    debug!("User {sender_id} posted message {} in session {session_id}", message.id);
    Ok(message)
}

pub async fn list_messages(
    store: &dyn ChatStore,
    session_id: Uuid,
) -> Result<Vec<ChatMessageRow>, ChatError> {
    if store.find_session(session_id).await?.is_none() {
        return Err(ChatError::SessionNotFound(session_id));
    }
    Ok(store.list_messages(session_id).await?)
}
