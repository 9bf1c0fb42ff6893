use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecordRow {
    pub id: Uuid,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub outcome: String,
    pub overall_score: f64,
    pub complete: bool,
    pub early_exit: bool,
    pub record: Value,
    pub submitted_at: DateTime<Utc>,
}
