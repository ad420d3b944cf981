pub mod documents;
pub mod onboarding;
