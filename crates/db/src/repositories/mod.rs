pub mod onboarding_progress_repo;
pub mod otp_repo;
pub mod verification_document_repo;
