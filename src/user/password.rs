use bcrypt::{hash, verify, DEFAULT_COST};

use crate::shared::AppError;

/// bcrypt only reads the first 72 bytes of input; reject longer passwords
/// instead of silently truncating them.
const MAX_PASSWORD_BYTES: usize = 72;

/// One-way hash with a per-call random salt embedded in the digest.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::Validation(format!(
            "password may not exceed {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }

    hash(plain, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("could not hash password: {}", e)))
}

/// Recomputes and compares in constant time. A mismatch is `Ok(false)`;
/// an error only signals a malformed stored digest.
pub fn verify_password(hashed: &str, plain: &str) -> Result<bool, AppError> {
    verify(plain, hashed).map_err(|e| AppError::Internal(format!("malformed password hash: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let digest = hash_password("correct horse battery staple").unwrap();

        assert_ne!(digest, "correct horse battery staple");
        assert!(verify_password(&digest, "correct horse battery staple").unwrap());
    }

    #[test]
    fn test_wrong_password_is_false_not_error() {
        let digest = hash_password("p").unwrap();
        assert!(!verify_password(&digest, "q").unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        // Per-call random salt
        let first = hash_password("p").unwrap();
        let second = hash_password("p").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_overlong_password_rejected() {
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            hash_password(&long),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_limit_is_inclusive() {
        let at_limit = "x".repeat(MAX_PASSWORD_BYTES);
        assert!(hash_password(&at_limit).is_ok());
    }

    #[test]
    fn test_malformed_digest_is_error() {
        assert!(matches!(
            verify_password("not-a-bcrypt-digest", "p"),
            Err(AppError::Internal(_))
        ));
    }
}
