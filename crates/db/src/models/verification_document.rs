//! Verification document entity model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use onelink_core::types::{DbId, Timestamp};

/// A row from the `verification_documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VerificationDocument {
    pub id: DbId,
    pub user_id: DbId,
    pub upload_id: Uuid,
    pub doc_type: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
