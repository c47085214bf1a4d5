//! PostgreSQL implementation of WebhookEventRepository.
//!
//! Deduplication relies on the primary key on `webhook_logs.event_id` and
//! `ON CONFLICT DO NOTHING`; concurrent deliveries of one event race on the
//! constraint, not on a prior read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{SaveResult, Severity, WebhookEventRecord, WebhookEventRepository};

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookLogRow {
    event_id: String,
    event_type: String,
    object_id: Option<String>,
    severity: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<WebhookLogRow> for WebhookEventRecord {
    fn from(row: WebhookLogRow) -> Self {
        WebhookEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            object_id: row.object_id,
            severity: Severity::from_stored(&row.severity),
            message: row.message,
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

/// Stored severity values at or above `min`.
fn severities_from(min: Severity) -> Vec<&'static str> {
    [Severity::Info, Severity::Warn, Severity::Error]
        .into_iter()
        .filter(|s| *s >= min)
        .map(|s| s.as_str())
        .collect()
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn insert_if_absent(
        &self,
        record: &WebhookEventRecord,
    ) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_logs (event_id, event_type, object_id, severity, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(&record.object_id)
        .bind(record.severity.as_str())
        .bind(&record.message)
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert webhook log", e))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn record_outcome(
        &self,
        event_id: &str,
        severity: Severity,
        message: &str,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE webhook_logs SET severity = $2, message = $3 WHERE event_id = $1")
            .bind(event_id)
            .bind(severity.as_str())
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to update webhook log", e))?;

        Ok(())
    }

    async fn list_recent(
        &self,
        min_severity: Severity,
        limit: u32,
    ) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let rows: Vec<WebhookLogRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, object_id, severity, message, created_at
            FROM webhook_logs
            WHERE severity = ANY($1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(severities_from(min_severity))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list webhook logs", e))?;

        Ok(rows.into_iter().map(WebhookEventRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_from_warn_excludes_info() {
        assert_eq!(severities_from(Severity::Warn), vec!["warn", "error"]);
        assert_eq!(severities_from(Severity::Info).len(), 3);
    }
}
