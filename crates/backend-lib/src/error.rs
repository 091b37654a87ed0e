// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with machine-readable codes
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No account exists for this email")]
    NoSuchUser,

    #[error("Password not set for this account")]
    NoPasswordSet,

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Password does not meet the strength requirements")]
    WeakPassword,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Authentication rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoSuchUser => StatusCode::NOT_FOUND,
            AppError::NoPasswordSet => StatusCode::BAD_REQUEST,
            AppError::WrongPassword | AppError::InvalidSession => StatusCode::UNAUTHORIZED,
            AppError::WeakPassword | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::InvalidEmail(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    ///
    /// Codes are the wire contract: the client routes on them (notably
    /// `NO_PASSWORD_SET`, which sends the user to password setup rather
    /// than a generic failure screen).
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NoSuchUser => "NO_SUCH_USER",
            AppError::NoPasswordSet => "NO_PASSWORD_SET",
            AppError::WrongPassword => "WRONG_PASSWORD",
            AppError::WeakPassword => "WEAK_PASSWORD",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::InvalidEmail(_) => "INVALID_EMAIL",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::InvalidSession => "INVALID_SESSION",
            AppError::RateLimited => "RATE_LIMITED",
            AppError::Internal(_) => "INTERNAL",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
        }
    }

    /// Get a sanitized message suitable for production use.
    ///
    /// Wrong-password and no-such-user share one message so responses do
    /// not confirm which emails have accounts.
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::NoSuchUser | AppError::WrongPassword => {
                "Authentication failed".to_string()
            },
            AppError::NoPasswordSet => {
                "Password not set. Please complete password setup first.".to_string()
            },
            AppError::WeakPassword => {
                "Password must be at least 8 characters long and contain at least one letter and one number"
                    .to_string()
            },
            AppError::DuplicateEmail => {
                "An account with this email already exists".to_string()
            },
            AppError::InvalidEmail(_) => {
                "Email address is not permitted for this workspace".to_string()
            },
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::InvalidSession => "Invalid or expired session".to_string(),
            AppError::RateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::Internal(_) | AppError::Io(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NoSuchUser.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NoPasswordSet.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::WrongPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidEmail("x".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::InvalidSession.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes_are_routable() {
        assert_eq!(AppError::NoPasswordSet.error_code(), "NO_PASSWORD_SET");
        assert_eq!(AppError::WeakPassword.error_code(), "WEAK_PASSWORD");
        assert_eq!(AppError::InvalidSession.error_code(), "INVALID_SESSION");
    }

    #[test]
    fn test_sanitized_messages_do_not_enumerate_users() {
        // NoSuchUser and WrongPassword must be indistinguishable to a
        // human reading the message.
        assert_eq!(
            AppError::NoSuchUser.sanitized_message(),
            AppError::WrongPassword.sanitized_message()
        );
        // NoPasswordSet is an expected, non-adversarial case and stays
        // distinct so the caller can route to password setup.
        assert_ne!(
            AppError::NoPasswordSet.sanitized_message(),
            AppError::WrongPassword.sanitized_message()
        );
    }

    #[test]
    fn test_into_response() {
        let response = AppError::InvalidSession.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let headers = response.headers();
        assert!(headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn test_from_impls() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));

        let app_err: AppError = "boom".into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
