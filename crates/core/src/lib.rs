//! Domain logic for the One-Link onboarding platform.
//!
//! Pure types and validation shared by the API, repository, and client
//! crates. Everything here is side-effect free: no I/O, no clocks beyond
//! explicit `chrono` parameters, no network.

pub mod documents;
pub mod error;
pub mod fields;
pub mod handle;
pub mod onboarding;
pub mod otp;
pub mod roles;
pub mod session;
pub mod types;
