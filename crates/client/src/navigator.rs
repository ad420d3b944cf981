//! The step-by-step wizard driver.
//!
//! A [`StepNavigator`] owns the working session and enforces the
//! ordering rules: a step is only left forwards once its data
//! validates and the server has accepted it, and only entered when the
//! navigation gate allows it.

use std::collections::BTreeSet;

use onelink_core::error::CoreError;
use onelink_core::fields::{ApplyMode, SessionPatch};
use onelink_core::onboarding::{can_navigate_to, validate_step, Flow, MAX_STEP};
use onelink_core::session::{OnboardingSession, StepSubmission, SubmitOutcome};

use crate::reconciler::Reconciler;
use crate::remote::RemoteError;

/// Errors from wizard navigation.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// A validation or gate rule rejected the operation.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The server refused or failed to store a completed step.
    #[error("Failed to save step {step}: {source}")]
    StepSaveFailed {
        step: u8,
        #[source]
        source: RemoteError,
    },

    /// Final submission failed.
    #[error("Submission failed: {source}")]
    SubmitFailed {
        #[source]
        source: RemoteError,
    },
}

/// Drives one wizard run.
pub struct StepNavigator {
    session: OnboardingSession,
    reconciler: Reconciler,
    /// Wire keys of fields edited this run; protects fresh local edits
    /// from being clobbered if progress is re-fetched.
    touched: BTreeSet<String>,
}

impl StepNavigator {
    /// Resume (or start) a session: merges the local snapshot and the
    /// server's progress over a fresh session for `base`'s flow/role.
    pub async fn load(base: OnboardingSession, reconciler: Reconciler) -> Self {
        let touched = BTreeSet::new();
        let session = reconciler.load(base, &touched).await;
        Self {
            session,
            reconciler,
            touched,
        }
    }

    /// The current working session.
    pub fn session(&self) -> &OnboardingSession {
        &self.session
    }

    pub fn current_step(&self) -> u8 {
        self.session.current_step
    }

    /// Apply field edits from the current step's form. The session is
    /// snapshotted locally (debounced); nothing goes to the server
    /// until the step advances.
    pub fn update_data(&mut self, patch: &SessionPatch) -> Result<(), WizardError> {
        self.session.apply_patch(patch, ApplyMode::Strict)?;
        self.touched.extend(patch.keys().iter().map(|k| k.to_string()));
        self.reconciler.snapshot(&self.session);
        Ok(())
    }

    /// Complete the current step and move forward.
    ///
    /// Order matters: validate, persist to the server, and only then
    /// mark the step completed and advance. A persistence failure
    /// leaves the session exactly where it was. Advancing from the
    /// final step is a no-op re-save (the cursor cannot leave the
    /// range), which also makes a double-tap of "next" idempotent.
    pub async fn advance(&mut self) -> Result<u8, WizardError> {
        let step = self.session.current_step;
        validate_step(self.session.flow, self.session.role, step, &self.session.fields)?;

        if self.session.flow == Flow::Standard {
            let submission = StepSubmission {
                role: self.session.role,
                current_step: step,
                completed_steps: self.session.completed_steps.clone(),
                patch: self.session.fields.to_patch(),
            };
            self.reconciler
                .persist_step(step, &submission)
                .await
                .map_err(|source| WizardError::StepSaveFailed { step, source })?;
        }

        self.session.mark_completed(step);
        self.session.current_step = (step + 1).min(MAX_STEP);
        self.reconciler.snapshot_now(&self.session);
        Ok(self.session.current_step)
    }

    /// Move back one step. Never validates or persists; data already
    /// entered stays in the session.
    pub fn retreat(&mut self) -> u8 {
        if self.session.current_step > 1 {
            self.session.current_step -= 1;
            self.reconciler.snapshot_now(&self.session);
        }
        self.session.current_step
    }

    /// Jump directly to a step. Returns `false` (leaving the cursor in
    /// place) when the gate rejects the target.
    pub fn go_to(&mut self, target: u8) -> bool {
        if !can_navigate_to(target, &self.session.completed_steps) {
            return false;
        }
        self.session.current_step = target;
        self.reconciler.snapshot_now(&self.session);
        true
    }

    /// Submit the finished application. Only valid on the final step.
    /// On success the local snapshot is cleared and the caller gets
    /// the post-onboarding redirect.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, WizardError> {
        if !self.session.is_final_step() {
            return Err(WizardError::Invalid(CoreError::Validation(format!(
                "Cannot submit from step {}; submission requires step {MAX_STEP}",
                self.session.current_step
            ))));
        }
        validate_step(
            self.session.flow,
            self.session.role,
            self.session.current_step,
            &self.session.fields,
        )?;

        if self.session.flow == Flow::Demo {
            // The demo flow has no server-side application to file;
            // finishing just clears the local snapshot.
            self.reconciler.clear();
            return Ok(SubmitOutcome {
                role: self.session.role,
                redirect_path: self.session.role.redirect_path().to_string(),
            });
        }

        let outcome = self
            .reconciler
            .submit()
            .await
            .map_err(|source| WizardError::SubmitFailed { source })?;
        self.session.mark_completed(MAX_STEP);
        Ok(outcome)
    }
}
