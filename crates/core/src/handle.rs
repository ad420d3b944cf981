//! Public handle (display name) rules.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// Handles that can never be claimed.
pub const RESERVED_HANDLES: &[&str] = &[
    "admin", "support", "onelink", "test", "demo", "api", "www", "mail", "ftp", "blog",
];

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.]{2,30}$").unwrap_or_else(|e| panic!("invalid handle regex: {e}"))
    })
}

/// Whether a handle is on the reserved list (case-insensitive).
pub fn is_reserved(handle: &str) -> bool {
    let lowered = handle.to_lowercase();
    RESERVED_HANDLES.contains(&lowered.as_str())
}

/// Validate the shape of a handle: 2-30 characters, letters, digits,
/// underscore, or dot. Reservation and uniqueness are checked
/// separately against the database.
pub fn validate_handle(handle: &str) -> Result<(), CoreError> {
    if !handle_pattern().is_match(handle) {
        return Err(CoreError::Validation(
            "Handle must be 2-30 characters: letters, digits, '_' or '.'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_handles_pass() {
        for handle in ["ab", "ada.lovelace", "Ada_99", "x".repeat(30).as_str()] {
            assert!(validate_handle(handle).is_ok(), "rejected: {handle}");
        }
    }

    #[test]
    fn invalid_handles_fail() {
        for handle in ["", "a", "has space", "dash-ed", "ünïcode", "x".repeat(31).as_str()] {
            assert!(validate_handle(handle).is_err(), "accepted: {handle}");
        }
    }

    #[test]
    fn reserved_is_case_insensitive() {
        assert!(is_reserved("admin"));
        assert!(is_reserved("Admin"));
        assert!(is_reserved("ONELINK"));
        assert!(!is_reserved("ada"));
    }
}
