pub mod documents;
pub mod health;
pub mod onboarding;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /onboarding/progress                 saved progress (GET)
/// /onboarding/step/{step}              save one completed step (POST)
/// /onboarding/submit                   final submission (POST)
/// /onboarding/send-otp                 issue a phone code (POST)
/// /onboarding/verify-otp               verify a phone code (POST)
/// /onboarding/check-handle             handle availability (GET)
///
/// /onboarding/documents                upload (POST), list (GET)
/// /onboarding/documents/{upload_id}    delete (DELETE)
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(onboarding::router())
        .merge(documents::router())
}
