//! Onboarding progress entity model.

use serde::Serialize;
use sqlx::FromRow;

use onelink_core::types::{DbId, Timestamp};

/// A row from the `onboarding_progress` table: one saved step for one
/// user. The aggregate cursor columns are duplicated on every row and
/// kept in sync on upsert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OnboardingProgressRow {
    pub id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub step: i32,
    pub data: serde_json::Value,
    pub current_step: i32,
    pub completed_steps: Vec<i32>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
