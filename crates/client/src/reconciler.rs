//! Dual persistence: local snapshots plus the server step log.
//!
//! The [`Reconciler`] owns both storage channels. Local snapshots are
//! best-effort and debounced; step saves go to the server and fail
//! loudly so the navigator can keep the step un-advanced.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use onelink_core::session::{
    reconcile, OnboardingSession, StepSubmission, SubmitOutcome, STORAGE_KEY,
};

use crate::cache::LocalCache;
use crate::debounce::Debouncer;
use crate::remote::{ProgressClient, RemoteError};

/// Quiet period before a dirty session is snapshotted locally.
pub const SNAPSHOT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Coordinates the local cache and the server step log for one session.
pub struct Reconciler {
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn ProgressClient>,
    snapshots: Debouncer<OnboardingSession>,
}

impl Reconciler {
    pub fn new(cache: Arc<dyn LocalCache>, remote: Arc<dyn ProgressClient>) -> Self {
        let snapshot_cache = Arc::clone(&cache);
        let snapshots = Debouncer::new(SNAPSHOT_DEBOUNCE, move |session: OnboardingSession| {
            write_snapshot(snapshot_cache.as_ref(), &session);
        });
        Self {
            cache,
            remote,
            snapshots,
        }
    }

    /// Read the cached snapshot, if any. Cache and parse failures are
    /// logged and treated as no snapshot.
    pub fn load_local(&self) -> Option<OnboardingSession> {
        let raw = match self.cache.get(STORAGE_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read local snapshot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable local snapshot");
                None
            }
        }
    }

    /// Build the working session: local snapshot over `base`, remote
    /// progress overlaid on top, then snapshot the merged result so
    /// the cache reflects what the user is about to see.
    ///
    /// A failed progress fetch degrades to local-only operation.
    pub async fn load(&self, base: OnboardingSession, touched: &BTreeSet<String>) -> OnboardingSession {
        let local = self.load_local();

        let remote = match self.remote.load_progress().await {
            Ok(progress) => progress,
            Err(err) => {
                tracing::debug!(error = %err, "Progress fetch failed, continuing with local state");
                None
            }
        };

        let merged = reconcile(base, local, remote.as_ref(), touched);
        write_snapshot(self.cache.as_ref(), &merged);
        merged
    }

    /// Queue a debounced local snapshot.
    pub fn snapshot(&self, session: &OnboardingSession) {
        self.snapshots.submit(session.clone());
    }

    /// Write a local snapshot immediately, bypassing the debounce.
    pub fn snapshot_now(&self, session: &OnboardingSession) {
        write_snapshot(self.cache.as_ref(), session);
    }

    /// Persist a completed step to the server. Unlike snapshots this
    /// propagates the error; the caller must not advance past a step
    /// the server has not accepted.
    pub async fn persist_step(
        &self,
        step: u8,
        submission: &StepSubmission,
    ) -> Result<(), RemoteError> {
        self.remote.save_step(step, submission).await
    }

    /// Submit the finished application and, on success, clear the
    /// local snapshot so a finished wizard cannot be resumed.
    pub async fn submit(&self) -> Result<SubmitOutcome, RemoteError> {
        let outcome = self.remote.submit().await?;
        self.clear();
        Ok(outcome)
    }

    /// Drop the local snapshot.
    pub fn clear(&self) {
        if let Err(err) = self.cache.remove(STORAGE_KEY) {
            tracing::warn!(error = %err, "Failed to clear local snapshot");
        }
    }
}

fn write_snapshot(cache: &dyn LocalCache, session: &OnboardingSession) {
    let raw = match serde_json::to_string(session) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to serialize session snapshot");
            return;
        }
    };
    if let Err(err) = cache.set(STORAGE_KEY, &raw) {
        tracing::warn!(error = %err, "Failed to write local snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onelink_core::onboarding::Flow;
    use onelink_core::roles::UserRole;

    use crate::cache::MemoryCache;
    use crate::remote::NoopProgressClient;

    fn reconciler_with(cache: Arc<MemoryCache>) -> Reconciler {
        Reconciler::new(cache, Arc::new(NoopProgressClient))
    }

    #[tokio::test]
    async fn load_returns_base_when_nothing_stored() {
        let cache = Arc::new(MemoryCache::new());
        let reconciler = reconciler_with(Arc::clone(&cache));

        let base = OnboardingSession::new(Flow::Standard, UserRole::Influencer);
        let session = reconciler.load(base.clone(), &BTreeSet::new()).await;
        assert_eq!(session, base);
        // The merged result was snapshotted.
        assert!(cache.get(STORAGE_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn load_prefers_cached_snapshot() {
        let cache = Arc::new(MemoryCache::new());
        let reconciler = reconciler_with(Arc::clone(&cache));

        let mut stored = OnboardingSession::new(Flow::Standard, UserRole::Influencer);
        stored.current_step = 3;
        stored.completed_steps = [1, 2].into();
        reconciler.snapshot_now(&stored);

        let base = OnboardingSession::new(Flow::Standard, UserRole::Influencer);
        let session = reconciler.load(base, &BTreeSet::new()).await;
        assert_eq!(session, stored);
    }

    #[tokio::test]
    async fn corrupt_snapshot_falls_back_to_base() {
        let cache = Arc::new(MemoryCache::new());
        cache.set(STORAGE_KEY, "not json").unwrap();
        let reconciler = reconciler_with(Arc::clone(&cache));

        let base = OnboardingSession::new(Flow::Standard, UserRole::Brand);
        let session = reconciler.load(base.clone(), &BTreeSet::new()).await;
        assert_eq!(session, base);
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let cache = Arc::new(MemoryCache::new());
        let reconciler = reconciler_with(Arc::clone(&cache));

        let session = OnboardingSession::new(Flow::Standard, UserRole::Influencer);
        reconciler.snapshot_now(&session);
        assert!(cache.get(STORAGE_KEY).unwrap().is_some());

        reconciler.clear();
        assert!(cache.get(STORAGE_KEY).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_snapshot_lands_after_quiet_period() {
        let cache = Arc::new(MemoryCache::new());
        let reconciler = reconciler_with(Arc::clone(&cache));

        let mut session = OnboardingSession::new(Flow::Standard, UserRole::Influencer);
        session.fields.basics.name = "Ada".to_string();
        reconciler.snapshot(&session);

        assert!(cache.get(STORAGE_KEY).unwrap().is_none());
        tokio::time::sleep(SNAPSHOT_DEBOUNCE + Duration::from_millis(100)).await;
        let raw = cache.get(STORAGE_KEY).unwrap().unwrap();
        assert!(raw.contains("Ada"));
    }
}
