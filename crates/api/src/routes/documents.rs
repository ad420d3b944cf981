//! Routes for verification document upload and management.

use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Mount the `/onboarding/documents` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/onboarding/documents",
            post(documents::upload_document).get(documents::list_documents),
        )
        .route(
            "/onboarding/documents/{upload_id}",
            delete(documents::delete_document),
        )
}
