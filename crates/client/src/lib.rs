//! Client-side wizard engine for the One-Link onboarding flow.
//!
//! Holds the in-memory session, snapshots it to a local cache on every
//! change (debounced), pushes completed steps to the server, and merges
//! both sources back together on load. The navigation rules and field
//! model come from `onelink-core`; this crate adds the persistence and
//! the step-by-step driver.

pub mod cache;
pub mod debounce;
pub mod navigator;
pub mod reconciler;
pub mod remote;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use navigator::{StepNavigator, WizardError};
pub use reconciler::Reconciler;
pub use remote::{HttpProgressClient, NoopProgressClient, ProgressClient, RemoteError};
