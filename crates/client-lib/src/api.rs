// ============================
// atrium-client-lib/src/api.rs
// ============================
//! API client for the auth backend.
//!
//! The gate talks to the backend through the [`AuthApi`] trait; the
//! [`HttpAuthApi`] implementation is the production client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use atrium_common::{
    AuthFailureReason, AuthResponse, CompleteProfileRequest, ErrorBody, LoginRequest,
    RegisterRequest, SetPasswordRequest, UserProfile,
};

/// HTTP request timeout in seconds.
/// Bounded so a dead backend surfaces as a retryable error instead of a
/// hung screen.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from the auth API client.
///
/// Structured failures (carrying an [`AuthFailureReason`]) are terminal
/// for the attempted operation; timeouts and transport errors are
/// transient and leave the caller free to retry.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication failure: {}", .0.as_code())]
    Failure(AuthFailureReason),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Transient failures the caller may retry without changing state
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Timeout | ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// The auth backend surface the gate depends on
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn register(&self, email: &str) -> Result<AuthResponse, ApiError>;
    async fn set_password(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;
    async fn complete_profile(
        &self,
        request: &CompleteProfileRequest,
    ) -> Result<AuthResponse, ApiError>;
    async fn validate(&self, token: &str) -> Result<AuthResponse, ApiError>;
    async fn refresh(&self, token: &str) -> Result<AuthResponse, ApiError>;
    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError>;
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
}

/// HTTP implementation of [`AuthApi`].
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling.
#[derive(Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = Self::check_response(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Unexpected(err.to_string()))
    }

    /// Map non-success responses to structured failures where the body
    /// carries a known machine-readable code
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
            if let Some(reason) = AuthFailureReason::from_code(&parsed.error.code) {
                return Err(ApiError::Failure(reason));
            }
            return Err(ApiError::Unexpected(format!(
                "{status}: {}",
                parsed.error.message
            )));
        }

        Err(ApiError::Unexpected(format!("{status}: {body}")))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("/auth/login", &body, None).await
    }

    async fn register(&self, email: &str) -> Result<AuthResponse, ApiError> {
        let body = RegisterRequest {
            email: email.to_string(),
        };
        self.post_json("/auth/register", &body, None).await
    }

    async fn set_password(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = SetPasswordRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("/auth/set-password", &body, None).await
    }

    async fn complete_profile(
        &self,
        request: &CompleteProfileRequest,
    ) -> Result<AuthResponse, ApiError> {
        self.post_json("/auth/complete-profile", request, None).await
    }

    async fn validate(&self, token: &str) -> Result<AuthResponse, ApiError> {
        let request = self.client.post(self.url("/auth/validate")).bearer_auth(token);
        let response = Self::check_response(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Unexpected(err.to_string()))
    }

    async fn refresh(&self, token: &str) -> Result<AuthResponse, ApiError> {
        let request = self.client.post(self.url("/auth/refresh")).bearer_auth(token);
        let response = Self::check_response(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Unexpected(err.to_string()))
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        let request = self.client.get(self.url("/auth/me")).bearer_auth(token);
        let response = Self::check_response(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Unexpected(err.to_string()))
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let request = self.client.post(self.url("/auth/logout")).bearer_auth(token);
        Self::check_response(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = HttpAuthApi::new("http://localhost:8080/").unwrap();
        assert_eq!(api.url("/auth/login"), "http://localhost:8080/auth/login");
    }

    #[test]
    fn transient_errors_are_distinguished() {
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Transport("reset".to_string()).is_transient());
        assert!(!ApiError::Failure(AuthFailureReason::WrongPassword).is_transient());
    }
}
