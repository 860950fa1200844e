//! Argon2id password hashing.

use std::sync::LazyLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash compared against when the username does not exist, so a lookup miss
/// costs the same as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("supplychat-dummy-password").ok());

/// Hash `plain` into a PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

/// `true` when `plain` matches the stored PHC string. A malformed hash never
/// matches.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Verify against `hashed` when a user was found, otherwise burn the same
/// effort on a dummy hash. Always `false` for a missing user.
pub fn verify_or_burn(plain: &str, hashed: Option<&str>) -> bool {
    match hashed {
        Some(hashed) => verify_password(plain, hashed),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(plain, dummy);
            }
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("manager123").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(verify_password("manager123", &hashed));
        assert!(!verify_password("manager124", &hashed));
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash_password("x").unwrap(), hash_password("x").unwrap());
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn missing_user_never_matches() {
        assert!(!verify_or_burn("supplychat-dummy-password", None));
    }
}
