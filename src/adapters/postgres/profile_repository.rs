//! PostgreSQL implementation of ProfileRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{parse_user_id_as_uuid, user_id_from_uuid};
use crate::domain::billing::{Plan, PlanUpdate, ProfilePlan};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::ProfileRepository;

pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    plan: Option<String>,
    is_admin: Option<bool>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    grace_started_at: Option<DateTime<Utc>>,
    grace_ends_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProfileRow> for ProfilePlan {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(ProfilePlan {
            user_id: user_id_from_uuid(row.id)?,
            plan: Plan::from_stored(row.plan.as_deref()),
            is_admin: row.is_admin.unwrap_or(false),
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            grace_started_at: row.grace_started_at.map(Timestamp::from_datetime),
            grace_ends_at: row.grace_ends_at.map(Timestamp::from_datetime),
            updated_at: row.updated_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_user_ids(user_ids: &[UserId]) -> Result<Vec<Uuid>, DomainError> {
    user_ids.iter().map(parse_user_id_as_uuid).collect()
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<ProfilePlan>, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;

        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT id, plan, is_admin, stripe_customer_id, stripe_subscription_id,
                   grace_started_at, grace_ends_at, updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to find profile", e))?;

        row.map(ProfilePlan::try_from).transpose()
    }

    async fn is_admin(&self, user_id: &UserId) -> Result<bool, DomainError> {
        // Non-UUID subjects cannot own a profile row.
        let Ok(user_uuid) = parse_user_id_as_uuid(user_id) else {
            return Ok(false);
        };

        let flag: Option<Option<bool>> =
            sqlx::query_scalar("SELECT is_admin FROM profiles WHERE id = $1")
                .bind(user_uuid)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to read admin flag", e))?;

        Ok(flag.flatten().unwrap_or(false))
    }

    async fn apply_plan(&self, user_id: &UserId, update: &PlanUpdate) -> Result<u64, DomainError> {
        let user_uuid = parse_user_id_as_uuid(user_id)?;
        let grace_starts = update.grace_window.map(|w| w.starts_at.into_datetime());
        let grace_ends = update.grace_window.map(|w| w.ends_at.into_datetime());

        // $3/$4 open the grace window only if none is set; NULL clears it.
        let result = match &update.billing_ids {
            Some(ids) => {
                sqlx::query(
                    r#"
                    UPDATE profiles SET
                        plan = $2,
                        grace_started_at = CASE WHEN $3::timestamptz IS NULL THEN NULL
                                                ELSE COALESCE(grace_started_at, $3) END,
                        grace_ends_at = CASE WHEN $4::timestamptz IS NULL THEN NULL
                                             ELSE COALESCE(grace_ends_at, $4) END,
                        updated_at = $5,
                        stripe_customer_id = $6,
                        stripe_subscription_id = $7
                    WHERE id = $1
                    "#,
                )
                .bind(user_uuid)
                .bind(update.plan.as_str())
                .bind(grace_starts)
                .bind(grace_ends)
                .bind(update.at.as_datetime())
                .bind(&ids.stripe_customer_id)
                .bind(&ids.stripe_subscription_id)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    UPDATE profiles SET
                        plan = $2,
                        grace_started_at = CASE WHEN $3::timestamptz IS NULL THEN NULL
                                                ELSE COALESCE(grace_started_at, $3) END,
                        grace_ends_at = CASE WHEN $4::timestamptz IS NULL THEN NULL
                                             ELSE COALESCE(grace_ends_at, $4) END,
                        updated_at = $5
                    WHERE id = $1
                    "#,
                )
                .bind(user_uuid)
                .bind(update.plan.as_str())
                .bind(grace_starts)
                .bind(grace_ends)
                .bind(update.at.as_datetime())
                .execute(&self.pool)
                .await
            }
        }
        .map_err(|e| DomainError::database("Failed to update profile plan", e))?;

        Ok(result.rows_affected())
    }

    async fn find_expired_grace(&self, now: Timestamp) -> Result<Vec<UserId>, DomainError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM profiles
            WHERE plan = 'grace'
              AND grace_ends_at IS NOT NULL
              AND grace_ends_at < $1
            "#,
        )
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to query expired grace profiles", e))?;

        ids.into_iter().map(user_id_from_uuid).collect()
    }

    async fn downgrade_to_free(
        &self,
        user_ids: &[UserId],
        now: Timestamp,
    ) -> Result<u64, DomainError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let uuids = parse_user_ids(user_ids)?;

        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                plan = 'free',
                grace_started_at = NULL,
                grace_ends_at = NULL,
                updated_at = $2
            WHERE id = ANY($1) AND plan = 'grace'
            "#,
        )
        .bind(&uuids)
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to downgrade grace profiles", e))?;

        Ok(result.rows_affected())
    }

    async fn plans_for(&self, user_ids: &[UserId]) -> Result<Vec<(UserId, Plan)>, DomainError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids = parse_user_ids(user_ids)?;

        let rows: Vec<(Uuid, Option<String>)> =
            sqlx::query_as("SELECT id, plan FROM profiles WHERE id = ANY($1)")
                .bind(&uuids)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to read profile plans", e))?;

        rows.into_iter()
            .map(|(id, plan)| Ok((user_id_from_uuid(id)?, Plan::from_stored(plan.as_deref()))))
            .collect()
    }
}
