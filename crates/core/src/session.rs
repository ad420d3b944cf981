//! Session state, remote step-log replay, and reconciliation.
//!
//! An [`OnboardingSession`] is the single in-memory source of truth
//! while the wizard runs. It is snapshotted to a local cache under
//! [`STORAGE_KEY`] and persisted remotely as an append-style step log;
//! [`reconcile`] merges the two on load with local-first precedence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::fields::{ApplyMode, RoleFields, SessionFields, SessionPatch};
use crate::onboarding::{Flow, OnboardingStatus, MAX_STEP, MIN_STEP};
use crate::roles::UserRole;

/// Cache key for the locally persisted session snapshot.
pub const STORAGE_KEY: &str = "onelink-onboarding";

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The complete client-side state of one wizard run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingSession {
    pub role: UserRole,
    pub flow: Flow,
    pub current_step: u8,
    pub completed_steps: BTreeSet<u8>,
    pub fields: SessionFields,
}

impl OnboardingSession {
    /// A fresh session starting at step 1 with empty fields.
    pub fn new(flow: Flow, role: UserRole) -> Self {
        Self {
            role,
            flow,
            current_step: MIN_STEP,
            completed_steps: BTreeSet::new(),
            fields: SessionFields::for_role(role),
        }
    }

    /// Apply a patch to the session fields.
    pub fn apply_patch(&mut self, patch: &SessionPatch, mode: ApplyMode) -> Result<(), CoreError> {
        patch.apply_to(&mut self.fields, mode)
    }

    /// Record a step as completed. Completion is monotonic; re-marking
    /// an already completed step is a no-op.
    pub fn mark_completed(&mut self, step: u8) {
        self.completed_steps.insert(step);
    }

    /// Whether the cursor sits on the final step.
    pub fn is_final_step(&self) -> bool {
        self.current_step == MAX_STEP
    }
}

// ---------------------------------------------------------------------------
// Remote progress
// ---------------------------------------------------------------------------

/// One entry in the server's per-step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLogEntry {
    pub step: u8,
    pub data: SessionPatch,
}

/// The server's view of a user's progress: aggregate cursor state plus
/// the raw per-step log, returned by the progress endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteProgress {
    pub role: Option<UserRole>,
    pub current_step: Option<u8>,
    #[serde(default)]
    pub completed_steps: BTreeSet<u8>,
    pub status: OnboardingStatus,
    #[serde(default)]
    pub steps: Vec<StepLogEntry>,
}

impl RemoteProgress {
    /// Fold the step log into one patch. Entries are folded in log
    /// order, so the entry written last wins per field regardless of
    /// its step number.
    pub fn replay(&self) -> SessionPatch {
        let mut folded = SessionPatch::default();
        for entry in &self.steps {
            folded.merge(entry.data.clone());
        }
        folded
    }

    /// Whether the server has any recorded progress at all.
    pub fn has_progress(&self) -> bool {
        !self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Payload sent when a step is saved: the cursor state plus the full
/// flattened field patch (the server stores it under the step's log
/// entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSubmission {
    pub role: UserRole,
    pub current_step: u8,
    pub completed_steps: BTreeSet<u8>,
    #[serde(flatten)]
    pub patch: SessionPatch,
}

/// Result of a successful final submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub role: UserRole,
    pub redirect_path: String,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Merge a cached local session and the server's progress into one
/// session, local-first.
///
/// Precedence, lowest to highest:
/// 1. `base` — a fresh session for the signed-up role.
/// 2. `local` — the cached snapshot, taken wholesale when present.
/// 3. `remote` — overlaid only when the server actually has progress
///    (at least one step entry); its replayed patch is applied
///    leniently after stripping any field the user has `touched` this
///    session, so in-flight edits survive a slow progress fetch.
///
/// A remote role differing from the working role switches the session
/// to the remote role and resets the role-specific fields before the
/// overlay. The resulting cursor is clamped to the valid step range.
pub fn reconcile(
    base: OnboardingSession,
    local: Option<OnboardingSession>,
    remote: Option<&RemoteProgress>,
    touched: &BTreeSet<String>,
) -> OnboardingSession {
    let mut session = local.unwrap_or(base);

    if let Some(remote) = remote {
        if remote.has_progress() {
            if let Some(role) = remote.role {
                if role != session.role {
                    session.role = role;
                    session.fields.role_fields = RoleFields::for_role(role);
                }
            }

            let mut patch = remote.replay();
            patch.strip_keys(touched);
            // Lenient: the log may hold entries written under a prior
            // role choice.
            if let Err(err) = patch.apply_to(&mut session.fields, ApplyMode::Lenient) {
                tracing::warn!(error = %err, "Failed to overlay remote progress");
            }

            if !remote.completed_steps.is_empty() {
                session.completed_steps = session
                    .completed_steps
                    .union(&remote.completed_steps)
                    .copied()
                    .collect();
            }
            if let Some(step) = remote.current_step {
                session.current_step = session.current_step.max(step);
            }
        }
    }

    session.current_step = session.current_step.clamp(MIN_STEP, MAX_STEP);
    session.completed_steps.retain(|s| (MIN_STEP..=MAX_STEP).contains(s));
    session
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
