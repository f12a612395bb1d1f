use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct TrainingProgressRow {
    pub user_id: Uuid,
    pub phase: String,
    pub day: i32,
    pub day_status: String,
    pub current_task: Option<Value>,
    pub submission_text: Option<String>,
    pub feedback: Option<String>,
    pub revision: i64,
}
