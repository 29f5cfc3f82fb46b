/// Password hashing and verification
use crate::error::{ApiError, ApiResult};

/// bcrypt work factor
const COST: u32 = 10;

/// Hash a plaintext password. The digest embeds its own salt.
pub fn hash(plaintext: &str) -> ApiResult<String> {
    bcrypt::hash(plaintext, COST)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored digest
pub fn verify(plaintext: &str, digest: &str) -> ApiResult<bool> {
    bcrypt::verify(plaintext, digest)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let digest = hash("Secret1").unwrap();
        assert_ne!(digest, "Secret1");
        assert!(verify("Secret1", &digest).unwrap());
        assert!(!verify("wrong", &digest).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash("Secret1").unwrap();
        let b = hash("Secret1").unwrap();
        assert_ne!(a, b);
    }
}
