//! Argon2id password hashing and the credential format checks.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Hashes `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow!("Failed to hash password: {e}")))
}

/// False on mismatch and on a hash that does not parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hashing is CPU-bound, so it runs on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Password hashing task failed: {e}")))?
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow!("Password check task failed: {e}")))
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Le mot de passe doit contenir au moins {MIN_PASSWORD_LEN} caractères"
        )));
    }
    if password != confirmation {
        return Err(AppError::Validation(
            "Les mots de passe ne correspondent pas".to_string(),
        ));
    }
    Ok(())
}

/// Basic shape check: one '@', a non-empty local part, a dotted domain.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let invalid = || AppError::Validation(format!("Adresse email invalide: '{email}'"));
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret42", &hash));
        assert!(!verify_password("secret43", &hash));
        // salted: same input, different hash
        assert_ne!(hash, hash_password("secret42").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("secret42", "c2VjcmV0NDJib2x0LWN2LXNhbHQ="));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_new_password_rules() {
        assert!(validate_new_password("abc12", "abc12").is_err());
        assert!(validate_new_password("abcdef", "abcdeg").is_err());
        assert!(validate_new_password("éàüöîç", "éàüöîç").is_ok());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("awa.diallo@mail.ne").is_ok());
        assert!(validate_email(" awa@mail.ne ").is_ok());
        for bad in ["awa", "@mail.ne", "awa@mail", "awa@@mail.ne", "a wa@mail.ne", "awa@.ne"] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }
}
