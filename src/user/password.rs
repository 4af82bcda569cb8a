use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_creates_argon2_hash() {
        let hash = hash_password("secure_password123").expect("Should hash password");
        assert!(hash.starts_with("$argon2"), "Hash should be Argon2 format");
    }

    #[test]
    fn test_hash_password_uses_random_salts() {
        let hash1 = hash_password("same_password").expect("Should hash password");
        let hash2 = hash_password("same_password").expect("Should hash password");
        assert_ne!(hash1, hash2, "Hashes should differ due to random salt");
    }

    #[test]
    fn test_verify_password_accepts_correct_password() {
        let hash = hash_password("test_password").expect("Should hash password");
        assert!(verify_password("test_password", &hash).expect("Should verify"));
    }

    #[test]
    fn test_verify_password_rejects_wrong_password() {
        let hash = hash_password("correct_password").expect("Should hash password");
        assert!(!verify_password("wrong_password", &hash).expect("Should verify"));
    }

    #[test]
    fn test_verify_password_rejects_invalid_hash() {
        assert!(verify_password("password", "not_a_hash").is_err());
    }
}
