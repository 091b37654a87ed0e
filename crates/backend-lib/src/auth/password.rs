// ============================
// atrium-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password strength requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRules {
    pub min_length: usize,
    pub require_letter: bool,
    pub require_digit: bool,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_letter: true,
            require_digit: true,
        }
    }
}

/// Hash a password using scrypt
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Check if a password meets the strength requirements.
///
/// No upper bound and no special-character requirement; length plus one
/// letter and one digit is the contract login screens surface.
pub fn validate_password_strength(password: &str, rules: &PasswordRules) -> bool {
    if password.len() < rules.min_length {
        return false;
    }

    if rules.require_letter && !password.chars().any(char::is_alphabetic) {
        return false;
    }

    if rules.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    true
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain)?;
    plain.zeroize();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength_validation() {
        let rules = PasswordRules::default();

        assert!(validate_password_strength("abc12345", &rules));
        assert!(validate_password_strength("correct horse 1", &rules));

        // no digit
        assert!(!validate_password_strength("abcdefgh", &rules));
        // too short, and no letter
        assert!(!validate_password_strength("1234567", &rules));
        // no letter
        assert!(!validate_password_strength("12345678", &rules));
        // too short
        assert!(!validate_password_strength("abc1234", &rules));
    }

    #[test]
    fn test_custom_rules() {
        let rules = PasswordRules {
            min_length: 4,
            require_letter: false,
            require_digit: false,
        };
        assert!(validate_password_strength("....", &rules));
        assert!(!validate_password_strength("...", &rules));
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("abc12345").unwrap();
        assert_ne!(hash, "abc12345");
        assert!(verify_password(&hash, "abc12345"));
        assert!(!verify_password(&hash, "abc12346"));
        // garbage hashes never verify
        assert!(!verify_password("not-a-phc-string", "abc12345"));
    }

    #[test]
    fn test_secure_hash_zeroizes_plaintext() {
        let mut plain = "abc12345".to_string();
        let hash = hash_password_secure(&mut plain).unwrap();
        assert!(plain.is_empty());
        assert!(verify_password(&hash, "abc12345"));
    }
}
