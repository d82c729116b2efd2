//! Password hashing and bearer-token helpers.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
const SCHEME: &str = "pbkdf2-sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Hashes a password with a fresh random salt and the default cost.
pub fn hash_password(password: &str) -> String {
    hash_password_with_iterations(password, PBKDF2_ITERATIONS)
}

/// Hashes a password with an explicit iteration count.
pub fn hash_password_with_iterations(password: &str, iterations: u32) -> String {
    let salt: [u8; SALT_LENGTH] = rand::random();
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);
    format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Checks a password against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };
    if iterations == 0 || expected.len() != HASH_LENGTH {
        return false;
    }

    let mut actual = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut actual);
    actual[..].ct_eq(&expected[..]).into()
}

/// Generates a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a bearer token as lowercase hex, the form kept in storage.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_token, hash_password_with_iterations, hash_token, verify_password};

    #[test]
    fn hashed_password_verifies_and_rejects_others() {
        let stored = hash_password_with_iterations("s3cret!", 1_000);
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("s3cret!", &stored));
        assert!(!verify_password("S3cret!", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password_with_iterations("pw", 1_000);
        let second = hash_password_with_iterations("pw", 1_000);
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "plain-text"));
        assert!(!verify_password("pw", "pbkdf2-sha256$abc$AAAA$AAAA"));
        assert!(!verify_password("pw", "bcrypt$10$AAAA$AAAA"));
    }

    #[test]
    fn tokens_are_unique_and_hash_to_hex() {
        let token = generate_token();
        assert_ne!(token, generate_token());
        let hashed = hash_token(&token);
        assert_eq!(hashed.len(), 64);
        assert!(hashed.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
