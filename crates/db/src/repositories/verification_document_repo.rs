//! Repository for the `verification_documents` table.

use sqlx::PgPool;
use uuid::Uuid;

use onelink_core::types::DbId;

use crate::models::verification_document::VerificationDocument;

/// Column list for `verification_documents` queries.
const COLUMNS: &str = "id, user_id, upload_id, doc_type, file_name, \
     content_type, size_bytes, storage_path, status, created_at, updated_at";

/// Provides CRUD operations for uploaded verification documents.
pub struct VerificationDocumentRepo;

impl VerificationDocumentRepo {
    /// Insert a new document record.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        upload_id: Uuid,
        doc_type: &str,
        file_name: &str,
        content_type: &str,
        size_bytes: i64,
        storage_path: &str,
    ) -> Result<VerificationDocument, sqlx::Error> {
        let query = format!(
            "INSERT INTO verification_documents \
             (user_id, upload_id, doc_type, file_name, content_type, size_bytes, storage_path) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VerificationDocument>(&query)
            .bind(user_id)
            .bind(upload_id)
            .bind(doc_type)
            .bind(file_name)
            .bind(content_type)
            .bind(size_bytes)
            .bind(storage_path)
            .fetch_one(pool)
            .await
    }

    /// All documents a user has uploaded, most recent first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<VerificationDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM verification_documents \
             WHERE user_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, VerificationDocument>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Find a document by its opaque upload handle, scoped to a user.
    pub async fn find_by_upload_id(
        pool: &PgPool,
        user_id: DbId,
        upload_id: Uuid,
    ) -> Result<Option<VerificationDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM verification_documents \
             WHERE user_id = $1 AND upload_id = $2"
        );
        sqlx::query_as::<_, VerificationDocument>(&query)
            .bind(user_id)
            .bind(upload_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a document. Returns the deleted row if it existed.
    pub async fn delete(
        pool: &PgPool,
        user_id: DbId,
        upload_id: Uuid,
    ) -> Result<Option<VerificationDocument>, sqlx::Error> {
        let query = format!(
            "DELETE FROM verification_documents \
             WHERE user_id = $1 AND upload_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VerificationDocument>(&query)
            .bind(user_id)
            .bind(upload_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the review status on every document a user has uploaded.
    pub async fn update_status_by_user(
        pool: &PgPool,
        user_id: DbId,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE verification_documents \
             SET status = $2, updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
