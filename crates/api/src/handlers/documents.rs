//! Handlers for verification document upload and management.
//!
//! Files land on local disk under `UPLOAD_DIR/{user_id}/{upload_id}`;
//! the database keeps the metadata and the opaque `upload_id` handle
//! that session fields reference.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use onelink_core::documents::{
    validate_content_type, validate_document_size, DocumentHandle, DocumentType,
};
use onelink_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use onelink_db::repositories::verification_document_repo::VerificationDocumentRepo;

/// One parsed upload: the declared document type plus the file part.
struct ParsedUpload {
    doc_type: DocumentType,
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Pull the `documentType` and `file` parts out of the multipart body.
async fn parse_upload(mut multipart: Multipart) -> AppResult<ParsedUpload> {
    let mut doc_type = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("documentType") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable documentType field: {e}")))?;
                doc_type = Some(DocumentType::from_str_db(&value)?);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .ok_or_else(|| {
                        AppError::BadRequest("File part is missing a content type".to_string())
                    })?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable file part: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let doc_type = doc_type
        .ok_or_else(|| AppError::BadRequest("Missing 'documentType' field".to_string()))?;
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    Ok(ParsedUpload {
        doc_type,
        file_name,
        content_type,
        bytes,
    })
}

// ---------------------------------------------------------------------------
// POST /onboarding/documents
// ---------------------------------------------------------------------------

/// Accept a verification document upload and return its handle.
pub async fn upload_document(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload = parse_upload(multipart).await?;

    if !DocumentType::allowed_for(auth.role).contains(&upload.doc_type) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Document type '{}' is not accepted for role '{}'",
            upload.doc_type.as_str(),
            auth.role.as_str()
        ))));
    }
    validate_content_type(&upload.content_type)?;
    validate_document_size(upload.bytes.len() as u64)?;

    let upload_id = Uuid::new_v4();
    let user_dir = state.config.upload_dir.join(auth.user_id.to_string());
    let storage_path = user_dir.join(upload_id.to_string());

    tokio::fs::create_dir_all(&user_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload directory: {e}")))?;
    tokio::fs::write(&storage_path, &upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    let document = VerificationDocumentRepo::create(
        &state.pool,
        auth.user_id,
        upload_id,
        upload.doc_type.as_str(),
        &upload.file_name,
        &upload.content_type,
        upload.bytes.len() as i64,
        &storage_path.to_string_lossy(),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        upload_id = %upload_id,
        doc_type = upload.doc_type.as_str(),
        size_bytes = document.size_bytes,
        "Verification document stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(DocumentHandle {
            upload_id: upload_id.to_string(),
            doc_type: upload.doc_type,
        })),
    ))
}

// ---------------------------------------------------------------------------
// GET /onboarding/documents
// ---------------------------------------------------------------------------

/// List the authenticated user's uploaded documents.
pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let documents = VerificationDocumentRepo::list_by_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse::new(documents)))
}

// ---------------------------------------------------------------------------
// DELETE /onboarding/documents/{upload_id}
// ---------------------------------------------------------------------------

/// Delete an uploaded document and its stored file.
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(upload_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let deleted = VerificationDocumentRepo::delete(&state.pool, auth.user_id, upload_id)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;

    if let Err(err) = tokio::fs::remove_file(&deleted.storage_path).await {
        // Metadata is already gone; a stale file is only a cleanup concern.
        tracing::warn!(error = %err, path = %deleted.storage_path, "Failed to remove stored file");
    }

    tracing::info!(
        user_id = auth.user_id,
        upload_id = %upload_id,
        "Verification document deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
