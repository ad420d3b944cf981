//! Repository for the `otp_codes` table.

use sqlx::PgPool;

use onelink_core::types::{DbId, Timestamp};

use crate::models::otp_code::OtpCode;

/// Column list for `otp_codes` queries.
const COLUMNS: &str = "id, user_id, phone, code_hash, attempts, \
     expires_at, verified_at, created_at";

/// Provides operations for phone verification codes.
pub struct OtpRepo;

impl OtpRepo {
    /// Issue a new code for a (user, phone), invalidating any previous
    /// unverified codes for the same pair.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        phone: &str,
        code_hash: &str,
        expires_at: Timestamp,
    ) -> Result<OtpCode, sqlx::Error> {
        sqlx::query(
            "DELETE FROM otp_codes \
             WHERE user_id = $1 AND phone = $2 AND verified_at IS NULL",
        )
        .bind(user_id)
        .bind(phone)
        .execute(pool)
        .await?;

        let query = format!(
            "INSERT INTO otp_codes (user_id, phone, code_hash, expires_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OtpCode>(&query)
            .bind(user_id)
            .bind(phone)
            .bind(code_hash)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// The latest unexpired, unverified code for a (user, phone).
    pub async fn find_active(
        pool: &PgPool,
        user_id: DbId,
        phone: &str,
    ) -> Result<Option<OtpCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM otp_codes \
             WHERE user_id = $1 AND phone = $2 \
               AND verified_at IS NULL AND expires_at > now() \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, OtpCode>(&query)
            .bind(user_id)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Record a failed verification attempt. Returns the new count.
    pub async fn increment_attempts(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "UPDATE otp_codes SET attempts = attempts + 1 \
             WHERE id = $1 \
             RETURNING attempts",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Mark a code as successfully verified.
    pub async fn mark_verified(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE otp_codes SET verified_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
