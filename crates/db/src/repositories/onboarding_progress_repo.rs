//! Repository for the `onboarding_progress` table.

use sqlx::PgPool;

use onelink_core::types::DbId;

use crate::models::onboarding_progress::OnboardingProgressRow;

/// Column list for `onboarding_progress` queries.
const COLUMNS: &str = "id, user_id, role, step, data, current_step, \
     completed_steps, status, created_at, updated_at";

/// Provides CRUD operations for the per-step onboarding log.
pub struct OnboardingProgressRepo;

impl OnboardingProgressRepo {
    /// Insert or overwrite the log entry for one (user, step). The
    /// aggregate cursor columns are written on every upsert so the
    /// latest row always carries the current values.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_step(
        pool: &PgPool,
        user_id: DbId,
        role: &str,
        step: i32,
        data: &serde_json::Value,
        current_step: i32,
        completed_steps: &[i32],
    ) -> Result<OnboardingProgressRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO onboarding_progress \
             (user_id, role, step, data, current_step, completed_steps) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ON CONSTRAINT uq_onboarding_progress_user_step \
             DO UPDATE SET role = $2, data = $4, current_step = $5, \
                 completed_steps = $6, updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingProgressRow>(&query)
            .bind(user_id)
            .bind(role)
            .bind(step)
            .bind(data)
            .bind(current_step)
            .bind(completed_steps)
            .fetch_one(pool)
            .await
    }

    /// All saved steps for a user, oldest write first. A re-saved step
    /// updates its row in place, so this ordering is the log order the
    /// client replays.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<OnboardingProgressRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM onboarding_progress \
             WHERE user_id = $1 \
             ORDER BY updated_at ASC, step ASC"
        );
        sqlx::query_as::<_, OnboardingProgressRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Mark every row for a user as completed. Returns the number of
    /// rows updated (zero when the user has no saved progress).
    pub async fn mark_completed(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE onboarding_progress \
             SET status = 'completed', updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Whether any other user's saved step data claims this handle.
    pub async fn handle_taken(
        pool: &PgPool,
        handle: &str,
        exclude_user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM onboarding_progress \
                 WHERE lower(data->>'displayName') = lower($1) \
                   AND user_id <> $2 \
             )",
        )
        .bind(handle)
        .bind(exclude_user_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
