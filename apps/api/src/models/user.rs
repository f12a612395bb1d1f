use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

pub const ROLE_GUIDE: &str = "guide";

/// Account row. The table is owned by the external account service and is
/// only read here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_guide(&self) -> bool {
        self.role == ROLE_GUIDE
    }
}

pub async fn find_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, email, name, role, created_at FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
