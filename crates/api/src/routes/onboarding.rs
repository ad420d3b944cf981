//! Routes for onboarding progress, verification, and submission.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

/// Mount the `/onboarding` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/onboarding/progress", get(onboarding::get_progress))
        .route("/onboarding/step/{step}", post(onboarding::save_step))
        .route("/onboarding/submit", post(onboarding::submit))
        .route("/onboarding/send-otp", post(onboarding::send_otp))
        .route("/onboarding/verify-otp", post(onboarding::verify_otp))
        .route("/onboarding/check-handle", get(onboarding::check_handle))
}
