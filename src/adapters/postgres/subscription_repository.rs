//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{parse_user_id_as_uuid, user_id_from_uuid};
use crate::domain::billing::{
    SubscriptionFilter, SubscriptionRecord, SubscriptionSnapshot, SubscriptionStatus,
};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::SubscriptionRepository;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a mirrored subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: Uuid,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: String,
    status: Option<String>,
    price_id: Option<String>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    past_due_seen_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            snapshot: SubscriptionSnapshot {
                user_id: user_id_from_uuid(row.user_id)?,
                stripe_customer_id: row.stripe_customer_id,
                stripe_subscription_id: row.stripe_subscription_id,
                status: row.status.map(SubscriptionStatus::new),
                price_id: row.price_id,
                current_period_end: row.current_period_end.map(Timestamp::from_datetime),
                cancel_at_period_end: row.cancel_at_period_end,
                updated_at: Timestamp::from_datetime(row.updated_at),
            },
            past_due_seen_at: row.past_due_seen_at.map(Timestamp::from_datetime),
        })
    }
}

/// Escapes LIKE metacharacters so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, stripe_customer_id, stripe_subscription_id, status, price_id,
           current_period_end, cancel_at_period_end, past_due_seen_at, updated_at
    FROM subscriptions
"#;

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert(&self, snapshot: &SubscriptionSnapshot) -> Result<(), DomainError> {
        let user_uuid = parse_user_id_as_uuid(&snapshot.user_id)?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, stripe_customer_id, stripe_subscription_id, status, price_id,
                current_period_end, cancel_at_period_end, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (stripe_subscription_id) DO UPDATE SET
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                status = EXCLUDED.status,
                price_id = EXCLUDED.price_id,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_uuid)
        .bind(&snapshot.stripe_customer_id)
        .bind(&snapshot.stripe_subscription_id)
        .bind(snapshot.status.as_ref().map(SubscriptionStatus::as_str))
        .bind(&snapshot.price_id)
        .bind(snapshot.current_period_end.map(Timestamp::into_datetime))
        .bind(snapshot.cancel_at_period_end)
        .bind(snapshot.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to upsert subscription", e))?;

        Ok(())
    }

    async fn find_user_id(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<UserId>, DomainError> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM subscriptions WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to look up subscription owner", e))?;

        user_id.map(user_id_from_uuid).transpose()
    }

    async fn find(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let sql = format!("{} WHERE stripe_subscription_id = $1", SELECT_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(stripe_subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to find subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn mark_past_due_seen(
        &self,
        stripe_subscription_id: &str,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE subscriptions SET past_due_seen_at = $2 WHERE stripe_subscription_id = $1",
        )
        .bind(stripe_subscription_id)
        .bind(at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to stamp past_due_seen_at", e))?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<SubscriptionSnapshot>, DomainError> {
        let sql = format!(
            r#"{}
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL
                   OR user_id::text ILIKE $2
                   OR stripe_subscription_id ILIKE $2)
            ORDER BY updated_at DESC
            LIMIT $3
            "#,
            SELECT_COLUMNS
        );

        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(filter.status.as_deref())
            .bind(filter.query.as_deref().map(like_pattern))
            .bind(i64::from(filter.effective_limit()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to list subscriptions", e))?;

        rows.into_iter()
            .map(|row| SubscriptionRecord::try_from(row).map(|record| record.snapshot))
            .collect()
    }
}
