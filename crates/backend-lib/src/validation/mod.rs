// ============================
// atrium-backend-lib/src/validation/mod.rs
// ============================
//! Input validation module.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::error::AppError;

// Common validation constants
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const SESSION_TOKEN_LENGTH: usize = 43; // 32 bytes, base64url without padding

// Regex patterns for validation
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static SESSION_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid session token: {0}")]
    InvalidSessionToken(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidEmail(msg) => AppError::InvalidEmail(msg),
            ValidationError::InvalidSessionToken(_) => AppError::InvalidSession,
        }
    }
}

/// Validate an email address's shape
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Case-insensitive check that an email belongs to the organization's
/// domain
pub fn email_has_domain(email: &str, domain: &str) -> bool {
    let suffix = format!("@{}", domain.to_lowercase());
    email.to_lowercase().ends_with(&suffix)
}

/// Validate a session token's shape before hitting the store
pub fn validate_session_token(token: &str) -> ValidationResult<&str> {
    if token.is_empty() {
        return Err(ValidationError::InvalidSessionToken(
            "Session token must not be empty".to_string(),
        ));
    }

    if token.len() != SESSION_TOKEN_LENGTH || !SESSION_TOKEN_REGEX.is_match(token) {
        return Err(ValidationError::InvalidSessionToken(
            "Invalid session token format".to_string(),
        ));
    }

    Ok(token)
}
