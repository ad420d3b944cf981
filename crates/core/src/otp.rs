//! Phone verification codes.
//!
//! Codes are six digits, valid for five minutes, and stored server-side
//! only as a salted hash of the phone number and code.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Number of digits in a verification code.
pub const OTP_LENGTH: usize = 6;

/// How long a code stays valid, in seconds.
pub const OTP_TTL_SECS: i64 = 300;

/// Verification attempts allowed before the code is invalidated.
pub const MAX_ATTEMPTS: i32 = 5;

/// Generate a random six-digit code, zero-padded.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

/// Hash a code together with the phone it was issued for. Binding the
/// phone into the digest stops a code issued for one number from
/// verifying another.
pub fn hash_code(phone: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Validate the shape of a submitted code: exactly six ASCII digits.
pub fn validate_code(code: &str) -> Result<(), CoreError> {
    if code.len() != OTP_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "Verification code must be exactly {OTP_LENGTH} digits"
        )));
    }
    Ok(())
}

/// Validate a phone number: at least ten characters, digits with an
/// optional leading `+`.
pub fn validate_phone(phone: &str) -> Result<(), CoreError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.len() < 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Validation(
            "Phone number must be at least 10 digits, with an optional leading '+'".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(validate_code(&code).is_ok(), "bad code: {code}");
        }
    }

    #[test]
    fn hash_is_stable_and_phone_bound() {
        let a = hash_code("+821012345678", "123456");
        let b = hash_code("+821012345678", "123456");
        let c = hash_code("+821087654321", "123456");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn validate_code_rejects_bad_shapes() {
        assert!(validate_code("12345").is_err());
        assert!(validate_code("1234567").is_err());
        assert!(validate_code("12345a").is_err());
        assert!(validate_code("").is_err());
        assert!(validate_code("000000").is_ok());
    }

    #[test]
    fn validate_phone_rules() {
        assert!(validate_phone("+821012345678").is_ok());
        assert!(validate_phone("01012345678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+8210-1234-5678").is_err());
        assert!(validate_phone("").is_err());
    }
}
