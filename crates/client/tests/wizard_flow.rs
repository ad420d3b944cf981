//! End-to-end wizard engine tests against an in-memory fake server.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;

use onelink_client::{
    LocalCache, MemoryCache, ProgressClient, Reconciler, RemoteError, StepNavigator, WizardError,
};
use onelink_core::documents::{DocumentHandle, DocumentType};
use onelink_core::fields::{SessionPatch, SocialLinks};
use onelink_core::onboarding::{Flow, OnboardingStatus};
use onelink_core::roles::UserRole;
use onelink_core::session::{
    OnboardingSession, RemoteProgress, StepLogEntry, StepSubmission, SubmitOutcome, STORAGE_KEY,
};

/// Fake progress server: records saves, serves canned progress, and
/// can be told to fail.
#[derive(Default)]
struct FakeServer {
    progress: Mutex<Option<RemoteProgress>>,
    saves: Mutex<Vec<(u8, StepSubmission)>>,
    submitted: AtomicBool,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl FakeServer {
    fn with_progress(progress: RemoteProgress) -> Self {
        Self {
            progress: Mutex::new(Some(progress)),
            ..Self::default()
        }
    }

    fn saved_steps(&self) -> Vec<u8> {
        self.saves.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }
}

#[async_trait]
impl ProgressClient for FakeServer {
    async fn load_progress(&self) -> Result<Option<RemoteProgress>, RemoteError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected("load disabled".to_string()));
        }
        Ok(self.progress.lock().unwrap().clone())
    }

    async fn save_step(&self, step: u8, submission: &StepSubmission) -> Result<(), RemoteError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.saves.lock().unwrap().push((step, submission.clone()));
        Ok(())
    }

    async fn submit(&self) -> Result<SubmitOutcome, RemoteError> {
        self.submitted.store(true, Ordering::SeqCst);
        Ok(SubmitOutcome {
            role: UserRole::Influencer,
            redirect_path: "/dashboard/influencer".to_string(),
        })
    }

    async fn upload_document(
        &self,
        doc_type: DocumentType,
        _file_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<DocumentHandle, RemoteError> {
        Ok(DocumentHandle {
            upload_id: "fake-upload".to_string(),
            doc_type,
        })
    }
}

fn handle(doc_type: DocumentType) -> DocumentHandle {
    DocumentHandle {
        upload_id: "u-1".to_string(),
        doc_type,
    }
}

fn step1_patch() -> SessionPatch {
    SessionPatch {
        name: Some("Ada Lovelace".to_string()),
        display_name: Some("ada".to_string()),
        country: Some("KR".to_string()),
        phone: Some("+821012345678".to_string()),
        phone_verified: Some(true),
        ..SessionPatch::default()
    }
}

fn step2_patch() -> SessionPatch {
    SessionPatch {
        social_links: Some(SocialLinks {
            instagram: Some("@ada".to_string()),
            ..SocialLinks::default()
        }),
        audience_size: Some("10k-50k".to_string()),
        niche_tags: Some(vec!["tech".to_string()]),
        bio: Some("I build things".to_string()),
        ..SessionPatch::default()
    }
}

fn step3_patch() -> SessionPatch {
    SessionPatch {
        id_document: Some(handle(DocumentType::IdDocument)),
        selfie_photo: Some(handle(DocumentType::SelfiePhoto)),
        ..SessionPatch::default()
    }
}

fn step4_patch() -> SessionPatch {
    SessionPatch {
        default_commission: Some(15.0),
        min_commission: Some(10.0),
        max_commission: Some(25.0),
        ..SessionPatch::default()
    }
}

async fn navigator_with(
    server: Arc<FakeServer>,
    cache: Arc<MemoryCache>,
    flow: Flow,
) -> StepNavigator {
    let reconciler = Reconciler::new(cache, server);
    StepNavigator::load(OnboardingSession::new(flow, UserRole::Influencer), reconciler).await
}

// -- full walkthrough --

#[tokio::test]
async fn influencer_completes_the_wizard() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(Arc::clone(&server), Arc::clone(&cache), Flow::Standard).await;

    nav.update_data(&step1_patch()).unwrap();
    assert_eq!(nav.advance().await.unwrap(), 2);
    nav.update_data(&step2_patch()).unwrap();
    assert_eq!(nav.advance().await.unwrap(), 3);
    nav.update_data(&step3_patch()).unwrap();
    assert_eq!(nav.advance().await.unwrap(), 4);
    nav.update_data(&step4_patch()).unwrap();
    assert_eq!(nav.advance().await.unwrap(), 5);

    let outcome = nav.submit().await.unwrap();
    assert_eq!(outcome.redirect_path, "/dashboard/influencer");
    assert_eq!(server.saved_steps(), vec![1, 2, 3, 4]);
    assert!(server.submitted.load(Ordering::SeqCst));
    // Submission clears the resumable snapshot.
    assert!(cache.get(STORAGE_KEY).unwrap().is_none());
}

// -- gating --

#[tokio::test]
async fn cannot_jump_past_uncompleted_steps() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(server, cache, Flow::Standard).await;

    assert!(!nav.go_to(3));
    assert_eq!(nav.current_step(), 1);

    nav.update_data(&step1_patch()).unwrap();
    nav.advance().await.unwrap();
    // Step 2 is reachable now, step 3 still is not.
    assert!(nav.go_to(2));
    assert!(!nav.go_to(3));
    assert!(nav.go_to(1));
}

#[tokio::test]
async fn invalid_step_data_blocks_advance() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(Arc::clone(&server), cache, Flow::Standard).await;

    let err = nav.advance().await.unwrap_err();
    assert_matches!(err, WizardError::Invalid(_));
    assert_eq!(nav.current_step(), 1);
    assert!(server.saved_steps().is_empty());
}

#[tokio::test]
async fn retreat_never_loses_entered_data() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(server, cache, Flow::Standard).await;

    nav.update_data(&step1_patch()).unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&step2_patch()).unwrap();

    assert_eq!(nav.retreat(), 1);
    assert_eq!(nav.retreat(), 1);
    assert_eq!(nav.session().fields.basics.name, "Ada Lovelace");
}

// -- persist-then-advance ordering --

#[tokio::test]
async fn failed_save_leaves_cursor_in_place() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(Arc::clone(&server), cache, Flow::Standard).await;

    nav.update_data(&step1_patch()).unwrap();
    server.fail_saves.store(true, Ordering::SeqCst);

    let err = nav.advance().await.unwrap_err();
    assert_matches!(err, WizardError::StepSaveFailed { step: 1, .. });
    assert_eq!(nav.current_step(), 1);
    assert!(nav.session().completed_steps.is_empty());

    // Retrying after the outage succeeds with the same data.
    server.fail_saves.store(false, Ordering::SeqCst);
    assert_eq!(nav.advance().await.unwrap(), 2);
    assert_eq!(server.saved_steps(), vec![1]);
}

#[tokio::test]
async fn advance_on_final_step_is_idempotent() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(Arc::clone(&server), cache, Flow::Standard).await;

    nav.update_data(&step1_patch()).unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&step2_patch()).unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&step3_patch()).unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&step4_patch()).unwrap();
    nav.advance().await.unwrap();

    // Double-tapping next on the final step stays put.
    assert_eq!(nav.advance().await.unwrap(), 5);
    assert_eq!(nav.current_step(), 5);
    assert_eq!(nav.session().completed_steps, BTreeSet::from([1, 2, 3, 4, 5]));
}

// -- resume --

#[tokio::test]
async fn resume_from_server_progress() {
    let server = Arc::new(FakeServer::with_progress(RemoteProgress {
        role: Some(UserRole::Influencer),
        current_step: Some(3),
        completed_steps: BTreeSet::from([1, 2]),
        status: OnboardingStatus::Draft,
        steps: vec![
            StepLogEntry {
                step: 1,
                data: step1_patch(),
            },
            StepLogEntry {
                step: 2,
                data: step2_patch(),
            },
        ],
    }));
    let cache = Arc::new(MemoryCache::new());
    let nav = navigator_with(server, cache, Flow::Standard).await;

    assert_eq!(nav.current_step(), 3);
    assert_eq!(nav.session().completed_steps, BTreeSet::from([1, 2]));
    assert_eq!(nav.session().fields.basics.name, "Ada Lovelace");
}

#[tokio::test]
async fn offline_reload_resumes_from_snapshot() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());

    {
        let mut nav =
            navigator_with(Arc::clone(&server), Arc::clone(&cache), Flow::Standard).await;
        nav.update_data(&step1_patch()).unwrap();
        nav.advance().await.unwrap();
    }

    // Progress fetch now fails; the cached snapshot carries the run.
    server.fail_loads.store(true, Ordering::SeqCst);
    let nav = navigator_with(server, cache, Flow::Standard).await;
    assert_eq!(nav.current_step(), 2);
    assert_eq!(nav.session().fields.basics.name, "Ada Lovelace");
}

#[tokio::test]
async fn empty_server_progress_keeps_local_state() {
    let server = Arc::new(FakeServer::with_progress(RemoteProgress {
        role: None,
        current_step: None,
        completed_steps: BTreeSet::new(),
        status: OnboardingStatus::Draft,
        steps: vec![],
    }));
    let cache = Arc::new(MemoryCache::new());

    {
        let mut nav =
            navigator_with(Arc::clone(&server), Arc::clone(&cache), Flow::Standard).await;
        nav.update_data(&step1_patch()).unwrap();
        nav.advance().await.unwrap();
    }

    let nav = navigator_with(server, cache, Flow::Standard).await;
    assert_eq!(nav.current_step(), 2);
    assert_eq!(nav.session().fields.basics.name, "Ada Lovelace");
}

// -- demo flow --

#[tokio::test]
async fn demo_flow_never_touches_the_server() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(Arc::clone(&server), Arc::clone(&cache), Flow::Demo).await;

    nav.update_data(&step1_patch()).unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&step2_patch()).unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&SessionPatch {
        documents_complete: Some(true),
        ..SessionPatch::default()
    })
    .unwrap();
    nav.advance().await.unwrap();
    nav.update_data(&step4_patch()).unwrap();
    nav.advance().await.unwrap();

    let outcome = nav.submit().await.unwrap();
    assert_eq!(outcome.redirect_path, "/dashboard/influencer");
    assert!(server.saved_steps().is_empty());
    assert!(!server.submitted.load(Ordering::SeqCst));
    assert!(cache.get(STORAGE_KEY).unwrap().is_none());
}

// -- submit preconditions --

#[tokio::test]
async fn submit_requires_final_step() {
    let server = Arc::new(FakeServer::default());
    let cache = Arc::new(MemoryCache::new());
    let mut nav = navigator_with(server, cache, Flow::Standard).await;

    let err = nav.submit().await.unwrap_err();
    assert_matches!(err, WizardError::Invalid(_));
}
