pub mod onboarding_progress;
pub mod otp_code;
pub mod verification_document;
