//! Request Lifecycle — `open -> accepted`, with a chat session created on
//! acceptance.
//!
//! The first guide to accept wins. The pre-checks here only produce good
//! error messages; correctness rests on `MentorshipStore::claim_open_request`
//! being an atomic compare-and-set on the request status.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::mentorship::request::MentorshipRequest;
use crate::models::mentorship::ChatSessionRow;

#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("Mentorship request {0} not found")]
    RequestNotFound(Uuid),

    #[error("Guide {0} not found")]
    GuideNotFound(Uuid),

    #[error("Mentorship request {0} is already accepted or closed")]
    RequestNotOpen(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Storage boundary for acceptance.
#[async_trait]
pub trait MentorshipStore: Send + Sync {
    async fn find_request(&self, request_id: Uuid) -> anyhow::Result<Option<MentorshipRequest>>;

    async fn guide_exists(&self, guide_id: Uuid) -> anyhow::Result<bool>;

    /// Atomically flips the request from `open` to `accepted` and records the
    /// session. Returns `None` when the request was no longer open, in which
    /// case nothing is written.
    async fn claim_open_request(
        &self,
        request: &MentorshipRequest,
        guide_id: Uuid,
    ) -> anyhow::Result<Option<ChatSessionRow>>;
}

pub async fn accept(
    store: &dyn MentorshipStore,
    request_id: Uuid,
    guide_id: Uuid,
) -> Result<ChatSessionRow, AcceptError> {
    let request = store
        .find_request(request_id)
        .await?
        .ok_or(AcceptError::RequestNotFound(request_id))?;

    if !store.guide_exists(guide_id).await? {
        return Err(AcceptError::GuideNotFound(guide_id));
    }

    if !request.is_open() {
        return Err(AcceptError::RequestNotOpen(request_id));
    }

    let session = store
        .claim_open_request(&request, guide_id)
        .await?
        .ok_or(AcceptError::RequestNotOpen(request_id))?;

    info!(
        "Guide {guide_id} accepted mentorship request {request_id}; session {}",
        session.id
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mentorship::request::RequestStatus;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Mutex;

    /// In-memory store. The claim holds the lock across the status check and
    /// the session insert, the same guarantee the SQL transaction gives.
    struct MemoryStore {
        requests: Mutex<HashMap<Uuid, MentorshipRequest>>,
        guides: HashSet<Uuid>,
        sessions: Mutex<Vec<ChatSessionRow>>,
    }

    impl MemoryStore {
        fn with_request(status: RequestStatus, guides: &[Uuid]) -> (Self, Uuid) {
            let request = MentorshipRequest {
                id: Uuid::new_v4(),
                explorer_id: Uuid::new_v4(),
                field: "Data Science".to_string(),
                title: "Breaking into ML".to_string(),
                description: String::new(),
                status,
                created_at: Utc::now(),
            };
            let id = request.id;
            let store = Self {
                requests: Mutex::new(HashMap::from([(id, request)])),
                guides: guides.iter().copied().collect(),
                sessions: Mutex::default(),
            };
            (store, id)
        }
    }

    #[async_trait]
    impl MentorshipStore for MemoryStore {
        async fn find_request(&self, request_id: Uuid) -> anyhow::Result<Option<MentorshipRequest>> {
            let found = self.requests.lock().await.get(&request_id).cloned();
            // Let a concurrent caller read the same snapshot before anyone claims.
            tokio::task::yield_now().await;
            Ok(found)
        }

        async fn guide_exists(&self, guide_id: Uuid) -> anyhow::Result<bool> {
            Ok(self.guides.contains(&guide_id))
        }

        async fn claim_open_request(
            &self,
            request: &MentorshipRequest,
            guide_id: Uuid,
        ) -> anyhow::Result<Option<ChatSessionRow>> {
            let mut requests = self.requests.lock().await;
            let Some(stored) = requests.get_mut(&request.id) else {
                return Ok(None);
            };
            if stored.status != RequestStatus::Open {
                return Ok(None);
            }
            stored.status = RequestStatus::Accepted;

            let session = ChatSessionRow {
                id: Uuid::new_v4(),
                request_id: stored.id,
                explorer_id: stored.explorer_id,
                guide_id,
                created_at: Utc::now(),
            };
            self.sessions.lock().await.push(session.clone());
            Ok(Some(session))
        }
    }

    #[tokio::test]
    async fn test_accept_open_request_creates_session() {
        let guide = Uuid::new_v4();
        let (store, request_id) = MemoryStore::with_request(RequestStatus::Open, &[guide]);

        let session = accept(&store, request_id, guide).await.unwrap();

        assert_eq!(session.request_id, request_id);
        assert_eq!(session.guide_id, guide);
        let requests = store.requests.lock().await;
        assert_eq!(requests[&request_id].status, RequestStatus::Accepted);
        assert_eq!(session.explorer_id, requests[&request_id].explorer_id);
        assert_eq!(store.sessions.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let guide = Uuid::new_v4();
        let (store, _) = MemoryStore::with_request(RequestStatus::Open, &[guide]);
        let missing = Uuid::new_v4();

        let err = accept(&store, missing, guide).await.unwrap_err();
        assert!(matches!(err, AcceptError::RequestNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_unknown_guide_is_not_found() {
        let (store, request_id) = MemoryStore::with_request(RequestStatus::Open, &[]);

        let err = accept(&store, request_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AcceptError::GuideNotFound(_)));
        assert!(store.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_accepted_request_cannot_be_accepted_again() {
        let guide = Uuid::new_v4();
        let (store, request_id) = MemoryStore::with_request(RequestStatus::Accepted, &[guide]);

        let err = accept(&store, request_id, guide).await.unwrap_err();
        assert!(matches!(err, AcceptError::RequestNotOpen(_)));
        assert!(store.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_accepts_have_exactly_one_winner() {
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let (store, request_id) = MemoryStore::with_request(RequestStatus::Open, &[first, second]);

        let (a, b) = tokio::join!(
            accept(&store, request_id, first),
            accept(&store, request_id, second)
        );

        let outcomes = [a, b];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        let losers = outcomes
            .iter()
            .filter(|r| matches!(r, Err(AcceptError::RequestNotOpen(_))))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(losers, 1);
        assert_eq!(store.sessions.lock().await.len(), 1);
    }
}
