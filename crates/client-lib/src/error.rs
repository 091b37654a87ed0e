// ============================
// atrium-client-lib/src/error.rs
// ============================
//! Gate-level error taxonomy.
use atrium_common::AuthFailureReason;
use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced by the auth gate to the UI.
///
/// `Transport` is the only retryable case; the gate's state is unchanged
/// when it is returned. Session invalidity is not an error at all - the
/// gate transitions to `LoggedOut` silently.
#[derive(Error, Debug)]
pub enum GateError {
    /// Bad input the user can correct inline
    #[error("{0}")]
    Validation(String),

    /// Credential failure; the display string is generic for
    /// wrong-password and no-such-user so the UI cannot leak which
    /// emails have accounts
    #[error("{}", credential_message(.0))]
    Credential(AuthFailureReason),

    #[error("Too many attempts, please try again later")]
    RateLimited,

    /// Transient network failure; retry without losing state
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl GateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Transport(_))
    }
}

fn credential_message(reason: &AuthFailureReason) -> &'static str {
    match reason {
        AuthFailureReason::DuplicateEmail => "An account with this email already exists",
        AuthFailureReason::NoPasswordSet => "Password setup is required for this account",
        _ => "Authentication failed",
    }
}

/// Map API client errors onto the gate taxonomy
pub(crate) fn map_api_error(err: ApiError) -> GateError {
    match err {
        ApiError::Failure(AuthFailureReason::WeakPassword) => GateError::Validation(
            "Password must be at least 8 characters long and contain at least one letter and one number"
                .to_string(),
        ),
        ApiError::Failure(AuthFailureReason::InvalidEmail) => GateError::Validation(
            "Only corporate email addresses are allowed".to_string(),
        ),
        ApiError::Failure(AuthFailureReason::RateLimited) => GateError::RateLimited,
        ApiError::Failure(reason) => GateError::Credential(reason),
        ApiError::Timeout => GateError::Transport("request timed out".to_string()),
        ApiError::Transport(msg) => GateError::Transport(msg),
        ApiError::Unexpected(msg) => GateError::Unexpected(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_and_no_such_user_read_the_same() {
        let wrong = GateError::Credential(AuthFailureReason::WrongPassword);
        let missing = GateError::Credential(AuthFailureReason::NoSuchUser);
        assert_eq!(wrong.to_string(), missing.to_string());
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(map_api_error(ApiError::Timeout).is_retryable());
        assert!(map_api_error(ApiError::Transport("down".to_string())).is_retryable());
        assert!(!map_api_error(ApiError::Failure(AuthFailureReason::WrongPassword)).is_retryable());
        assert!(!map_api_error(ApiError::Unexpected("???".to_string())).is_retryable());
    }
}
