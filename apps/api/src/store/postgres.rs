use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{SessionStore, StorageError};
use crate::interview::models::SessionRecord;
use crate::models::session::SessionRecordRow;

/// Postgres-backed store. Rows keep the headline fields as columns and the
/// full record as JSONB.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `session_records` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_records (
                id              UUID PRIMARY KEY,
                candidate_name  TEXT,
                candidate_email TEXT,
                outcome         TEXT NOT NULL,
                overall_score   DOUBLE PRECISION NOT NULL,
                complete        BOOLEAN NOT NULL,
                early_exit      BOOLEAN NOT NULL,
                record          JSONB NOT NULL,
                submitted_at    TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("session_records table ready");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, record: &SessionRecord) -> Result<String, StorageError> {
        let data = serde_json::to_value(record)?;
        let outcome = serde_json::to_value(record.decision.outcome)?;

        sqlx::query(
            r#"
            INSERT INTO session_records
                (id, candidate_name, candidate_email, outcome, overall_score,
                 complete, early_exit, record, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET record = EXCLUDED.record
            "#,
        )
        .bind(record.session_id)
        .bind(record.candidate.name.as_deref())
        .bind(record.candidate.email.as_deref())
        .bind(outcome.as_str().unwrap_or_default())
        .bind(record.decision.overall_score)
        .bind(record.decision.complete)
        .bind(record.early_exit)
        .bind(&data)
        .bind(record.submission_timestamp)
        .execute(&self.pool)
        .await?;

        info!("Inserted session record {}", record.session_id);
        Ok(format!("session_records/{}", record.session_id))
    }

    async fn list(&self) -> Result<Vec<SessionRecord>, StorageError> {
        let rows: Vec<SessionRecordRow> = sqlx::query_as(
            r#"
            SELECT id, candidate_name, candidate_email, outcome, overall_score,
                   complete, early_exit, record, submitted_at
            FROM session_records
            ORDER BY submitted_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row.record).map_err(StorageError::from))
            .collect()
    }
}
