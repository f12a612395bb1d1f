use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::mentorship::store::PgMentorshipStore;
use crate::training::oracle::ContentOracle;
use crate::training::store::ProgressStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub mentorship: PgMentorshipStore,
    /// Training records. Default: PgProgressStore.
    pub progress: Arc<dyn ProgressStore>,
    /// Task generator and grader. Default: LlmOracle.
    pub oracle: Arc<dyn ContentOracle>,
    pub config: Config,
}
