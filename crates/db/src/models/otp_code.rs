//! Phone verification code entity model.

use sqlx::FromRow;

use onelink_core::types::{DbId, Timestamp};

/// A row from the `otp_codes` table. Never serialized to clients.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: DbId,
    pub user_id: DbId,
    pub phone: String,
    pub code_hash: String,
    pub attempts: i32,
    pub expires_at: Timestamp,
    pub verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
