//! Handlers for onboarding progress, phone verification, handle checks,
//! and final submission.
//!
//! Progress is stored as a per-step log: one row per (user, step), each
//! holding that step's flattened field patch plus the aggregate cursor
//! columns. GET /progress folds the rows back into one view for the
//! client to replay.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use serde::{Deserialize, Serialize};

use onelink_core::error::CoreError;
use onelink_core::fields::{ApplyMode, SessionFields, SessionPatch};
use onelink_core::onboarding::{validate_step, validate_step_number, Flow, OnboardingStatus, MAX_STEP};
use onelink_core::roles::UserRole;
use onelink_core::session::{RemoteProgress, StepLogEntry, StepSubmission, SubmitOutcome};
use onelink_core::{handle, otp};
use onelink_db::models::onboarding_progress::OnboardingProgressRow;
use onelink_db::repositories::onboarding_progress_repo::OnboardingProgressRepo;
use onelink_db::repositories::otp_repo::OtpRepo;
use onelink_db::repositories::verification_document_repo::VerificationDocumentRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fold the per-step rows into the aggregate progress view: the role
/// and status from the rows, the highest cursor, the union of
/// completed steps, and the raw step log in write order.
fn fold_progress(rows: &[OnboardingProgressRow]) -> AppResult<RemoteProgress> {
    let mut role = None;
    let mut current_step = None;
    let mut completed_steps = std::collections::BTreeSet::new();
    let mut status = OnboardingStatus::Draft;
    let mut steps = Vec::with_capacity(rows.len());

    for row in rows {
        role = Some(UserRole::from_str_db(&row.role)?);
        if let Ok(cursor) = u8::try_from(row.current_step) {
            current_step = Some(current_step.unwrap_or(0).max(cursor));
        }
        completed_steps.extend(row.completed_steps.iter().filter_map(|s| u8::try_from(*s).ok()));
        if OnboardingStatus::from_str_db(&row.status)? == OnboardingStatus::Completed {
            status = OnboardingStatus::Completed;
        }
        let data: SessionPatch = serde_json::from_value(row.data.clone())
            .map_err(|e| AppError::InternalError(format!("Unreadable step data: {e}")))?;
        if let Ok(step) = u8::try_from(row.step) {
            steps.push(StepLogEntry { step, data });
        }
    }

    Ok(RemoteProgress {
        role,
        current_step,
        completed_steps,
        status,
        steps,
    })
}

/// Rebuild the full session fields from the saved step log.
fn fields_from_progress(progress: &RemoteProgress, role: UserRole) -> SessionFields {
    let mut fields = SessionFields::for_role(role);
    let patch = progress.replay();
    // Lenient: older entries may predate a role switch.
    if let Err(err) = patch.apply_to(&mut fields, ApplyMode::Lenient) {
        tracing::warn!(error = %err, "Failed to replay saved step data");
    }
    fields
}

// ---------------------------------------------------------------------------
// GET /onboarding/progress
// ---------------------------------------------------------------------------

/// Return the authenticated user's saved progress: the aggregate cursor
/// plus the raw per-step log.
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let rows = OnboardingProgressRepo::list_by_user(&state.pool, auth.user_id).await?;
    let progress = fold_progress(&rows)?;
    Ok(Json(DataResponse::new(progress)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/step/{step}
// ---------------------------------------------------------------------------

/// Save one completed step.
///
/// The step's data must validate for the submitted role before the row
/// is written. The stored cursor is advanced past the saved step so a
/// resume from another device lands on the next step.
pub async fn save_step(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(step): Path<u8>,
    Json(body): Json<StepSubmission>,
) -> AppResult<impl IntoResponse> {
    validate_step_number(step)?;

    let mut fields = SessionFields::for_role(body.role);
    body.patch.apply_to(&mut fields, ApplyMode::Strict)?;
    validate_step(Flow::Standard, body.role, step, &fields)?;

    let mut completed: Vec<i32> = body
        .completed_steps
        .iter()
        .map(|s| *s as i32)
        .chain(std::iter::once(step as i32))
        .collect();
    completed.sort_unstable();
    completed.dedup();

    let next_step = (step + 1).min(MAX_STEP) as i32;
    let data = serde_json::to_value(&body.patch)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize step data: {e}")))?;

    let row = OnboardingProgressRepo::upsert_step(
        &state.pool,
        auth.user_id,
        body.role.as_str(),
        step as i32,
        &data,
        next_step,
        &completed,
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        step,
        role = body.role.as_str(),
        "Onboarding step saved"
    );

    Ok(Json(DataResponse::new(row)))
}

// ---------------------------------------------------------------------------
// POST /onboarding/submit
// ---------------------------------------------------------------------------

/// Submit the finished application.
///
/// Rebuilds the session from the step log, re-checks that every
/// required verification document is attached, and marks the whole
/// record completed. Responds with the post-onboarding redirect.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<impl IntoResponse> {
    let rows = OnboardingProgressRepo::list_by_user(&state.pool, auth.user_id).await?;
    if rows.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "No onboarding progress to submit".to_string(),
        )));
    }

    let progress = fold_progress(&rows)?;
    let role = progress.role.unwrap_or(auth.role);
    let fields = fields_from_progress(&progress, role);

    let missing = missing_documents(role, &fields);
    if !missing.is_empty() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Missing required documents: {}",
            missing.join(", ")
        ))));
    }

    OnboardingProgressRepo::mark_completed(&state.pool, auth.user_id).await?;
    VerificationDocumentRepo::update_status_by_user(&state.pool, auth.user_id, "submitted").await?;

    tracing::info!(
        user_id = auth.user_id,
        role = role.db_role(),
        "Onboarding application submitted"
    );

    Ok(Json(DataResponse::new(SubmitOutcome {
        role,
        redirect_path: role.redirect_path().to_string(),
    })))
}

/// The required document slots that are still empty, by wire name.
fn missing_documents(role: UserRole, fields: &SessionFields) -> Vec<&'static str> {
    use onelink_core::fields::RoleFields;

    let mut missing = Vec::new();
    match (&fields.role_fields, role) {
        (RoleFields::Influencer { verification, .. }, UserRole::Influencer) => {
            if verification.id_document.is_none() {
                missing.push("idDocument");
            }
            if verification.selfie_photo.is_none() {
                missing.push("selfiePhoto");
            }
        }
        (RoleFields::Brand { verification, .. }, UserRole::Brand) => {
            if verification.business_registration.is_none() {
                missing.push("businessRegistration");
            }
            if verification.authorized_rep_id.is_none() {
                missing.push("authorizedRepId");
            }
            if verification.bank_account_book.is_none() {
                missing.push("bankAccountBook");
            }
        }
        _ => missing.push("roleMismatch"),
    }
    missing
}

// ---------------------------------------------------------------------------
// POST /onboarding/send-otp
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub sent: bool,
    /// Populated only when `EXPOSE_OTP_CODES` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Issue a phone verification code. Re-sending invalidates prior codes
/// for the same phone.
pub async fn send_otp(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SendOtpRequest>,
) -> AppResult<impl IntoResponse> {
    otp::validate_phone(&body.phone)?;

    let code = otp::generate_code();
    let code_hash = otp::hash_code(&body.phone, &code);
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(otp::OTP_TTL_SECS);

    OtpRepo::create(&state.pool, auth.user_id, &body.phone, &code_hash, expires_at).await?;

    tracing::info!(user_id = auth.user_id, "Verification code issued");

    // SMS dispatch is handled by an external notifier watching the
    // otp_codes table; in development the code can be returned inline.
    let exposed = state.config.expose_otp_codes.then_some(code);
    Ok(Json(DataResponse::new(SendOtpResponse {
        sent: true,
        code: exposed,
    })))
}

// ---------------------------------------------------------------------------
// POST /onboarding/verify-otp
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub verified: bool,
}

/// Check a submitted verification code against the active one.
pub async fn verify_otp(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<VerifyOtpRequest>,
) -> AppResult<impl IntoResponse> {
    otp::validate_phone(&body.phone)?;
    otp::validate_code(&body.code)?;

    let active = OtpRepo::find_active(&state.pool, auth.user_id, &body.phone)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "No active verification code for this phone".to_string(),
            ))
        })?;

    if active.attempts >= otp::MAX_ATTEMPTS {
        return Err(AppError::Core(CoreError::RateLimited(
            "Too many failed attempts; request a new code".to_string(),
        )));
    }

    if otp::hash_code(&body.phone, &body.code) != active.code_hash {
        let attempts = OtpRepo::increment_attempts(&state.pool, active.id).await?;
        tracing::debug!(user_id = auth.user_id, attempts, "Verification code mismatch");
        return Err(AppError::Core(CoreError::Validation(
            "Incorrect verification code".to_string(),
        )));
    }

    OtpRepo::mark_verified(&state.pool, active.id).await?;
    tracing::info!(user_id = auth.user_id, "Phone verified");

    Ok(Json(DataResponse::new(VerifyOtpResponse { verified: true })))
}

// ---------------------------------------------------------------------------
// GET /onboarding/check-handle
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CheckHandleParams {
    pub handle: String,
}

#[derive(Debug, Serialize)]
pub struct CheckHandleResponse {
    pub handle: String,
    pub available: bool,
}

/// Check whether a display handle is valid, unreserved, and unclaimed.
pub async fn check_handle(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<CheckHandleParams>,
) -> AppResult<impl IntoResponse> {
    handle::validate_handle(&params.handle)?;

    let available = if handle::is_reserved(&params.handle) {
        false
    } else {
        !OnboardingProgressRepo::handle_taken(&state.pool, &params.handle, auth.user_id).await?
    };

    Ok(Json(DataResponse::new(CheckHandleResponse {
        handle: params.handle,
        available,
    })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use onelink_core::documents::{DocumentHandle, DocumentType};

    fn row(step: i32, data: serde_json::Value) -> OnboardingProgressRow {
        OnboardingProgressRow {
            id: step as i64,
            user_id: 1,
            role: "influencer".to_string(),
            step,
            data,
            current_step: step + 1,
            completed_steps: (1..=step).collect(),
            status: "draft".to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn fold_progress_of_empty_log_has_no_cursor() {
        let progress = fold_progress(&[]).unwrap();
        assert!(progress.role.is_none());
        assert!(progress.current_step.is_none());
        assert!(!progress.has_progress());
    }

    #[test]
    fn fold_progress_takes_max_cursor_and_union() {
        let rows = vec![
            row(1, serde_json::json!({"name": "Ada"})),
            row(3, serde_json::json!({"bio": "builder"})),
        ];
        let progress = fold_progress(&rows).unwrap();
        assert_eq!(progress.role, Some(UserRole::Influencer));
        assert_eq!(progress.current_step, Some(4));
        assert_eq!(
            progress.completed_steps,
            std::collections::BTreeSet::from([1, 2, 3])
        );
        assert_eq!(progress.steps.len(), 2);
    }

    #[test]
    fn fold_progress_skips_out_of_range_rows() {
        // A corrupt row outside u8 range must not wrap into a valid
        // step number.
        let rows = vec![
            row(1, serde_json::json!({"name": "Ada"})),
            row(300, serde_json::json!({})),
        ];
        let progress = fold_progress(&rows).unwrap();
        assert_eq!(progress.current_step, Some(2));
        assert_eq!(progress.steps.len(), 1);
        assert_eq!(progress.steps[0].step, 1);
    }

    #[test]
    fn missing_documents_lists_empty_slots() {
        let fields = SessionFields::for_role(UserRole::Influencer);
        assert_eq!(
            missing_documents(UserRole::Influencer, &fields),
            vec!["idDocument", "selfiePhoto"]
        );
    }

    #[test]
    fn missing_documents_empty_when_all_present() {
        let mut fields = SessionFields::for_role(UserRole::Influencer);
        let patch = SessionPatch {
            id_document: Some(DocumentHandle {
                upload_id: "u-1".to_string(),
                doc_type: DocumentType::IdDocument,
            }),
            selfie_photo: Some(DocumentHandle {
                upload_id: "u-2".to_string(),
                doc_type: DocumentType::SelfiePhoto,
            }),
            ..SessionPatch::default()
        };
        patch.apply_to(&mut fields, ApplyMode::Strict).unwrap();
        assert!(missing_documents(UserRole::Influencer, &fields).is_empty());
    }
}
