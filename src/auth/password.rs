use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use tracing::debug;

/// Password hashing failure
#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordError(String);

/// One-way digest of `password` as a self-describing PHC string.
///
/// Every call draws a new salt, so two digests of one password differ and
/// both still verify.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// Whether `password` produces `digest`; a digest that does not parse matches nothing
pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!("Ignoring malformed password digest: {}", e);
            false
        }
    }
}
