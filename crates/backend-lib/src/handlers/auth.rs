// ============================
// atrium-backend-lib/src/handlers/auth.rs
// ============================
//! Auth endpoint handlers.
use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use metrics::counter;
use std::sync::Arc;

use atrium_common::{
    AgentConfigUpdate, AuthResponse, CompleteProfileRequest, LoginRequest, PreferencesUpdate,
    RegisterRequest, ResetPasswordRequest, SetPasswordRequest, UserProfile,
};

use crate::error::AppError;
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, PASSWORD_SET, PROFILE_COMPLETED};
use crate::storage::{Storage, UserRecord};
use crate::validation;
use crate::AppState;

/// The authenticated caller, resolved from the bearer token.
///
/// Resolution goes through the session manager, so it also refreshes the
/// user's `last_active` and purges the session if it turned out expired.
pub struct CurrentUser {
    pub user: UserRecord,
    pub token: String,
}

/// Extract the bearer token from request headers
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

impl<S> FromRequestParts<Arc<AppState<S>>> for CurrentUser
where
    S: Storage + Clone + Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::InvalidSession)?;
        validation::validate_session_token(&token)?;

        let user = state
            .sessions
            .resolve_session(&token)
            .await?
            .ok_or(AppError::InvalidSession)?;

        Ok(CurrentUser { user, token })
    }
}

fn auth_response(token: String, user: &UserRecord) -> Json<AuthResponse> {
    Json(AuthResponse {
        token,
        user: user.profile(),
    })
}

/// Authenticate with email and password, issuing a session on success
pub async fn login<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let key = req.email.trim().to_lowercase();
    if !state.auth_limiter.check_rate_limit(&key) {
        return Err(AppError::RateLimited);
    }

    match state.credentials.authenticate(&req.email, &req.password).await {
        Ok(user) => {
            state.auth_limiter.record_success(&key);
            let session = state.sessions.create_session(&user.id).await?;
            counter!(LOGIN_SUCCESS).increment(1);
            Ok(auth_response(session.token, &user))
        },
        Err(err) => {
            if matches!(err, AppError::WrongPassword) {
                state.auth_limiter.record_failed_attempt(&key);
            }
            counter!(LOGIN_FAILURE).increment(1);
            Err(err)
        },
    }
}

/// Create a bare account (no password, no role) and log it in.
/// The setup screens take it from here.
pub async fn register<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let user = state.credentials.create_user(&req.email, None, None, None).await?;
    let session = state.sessions.create_session(&user.id).await?;
    Ok(auth_response(session.token, &user))
}

/// Set a password by email (migration/invite flow), issuing a session
pub async fn set_password<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<Json<AuthResponse>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let user = state.credentials.set_password(&req.email, req.password).await?;
    counter!(PASSWORD_SET).increment(1);

    let session = state.sessions.create_session(&user.id).await?;
    Ok(auth_response(session.token, &user))
}

/// Complete the profile setup step, issuing a session
pub async fn complete_profile<S>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CompleteProfileRequest>,
) -> Result<Json<AuthResponse>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let user = state
        .credentials
        .complete_profile(
            &req.email,
            req.role,
            req.preferences.as_ref(),
            req.agent_config.as_ref(),
        )
        .await?;
    counter!(PROFILE_COMPLETED).increment(1);

    let session = state.sessions.create_session(&user.id).await?;
    Ok(auth_response(session.token, &user))
}

/// Validate the presented token and echo it with the current user
pub async fn validate(current: CurrentUser) -> Json<AuthResponse> {
    Json(AuthResponse {
        token: current.token,
        user: current.user.profile(),
    })
}

/// Issue a fresh session for the presented (still valid) token.
/// The old session keeps its own absolute expiry.
pub async fn refresh<S>(
    State(state): State<Arc<AppState<S>>>,
    current: CurrentUser,
) -> Result<Json<AuthResponse>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let session = state.sessions.create_session(&current.user.id).await?;
    Ok(auth_response(session.token, &current.user))
}

/// Current user info
pub async fn me(current: CurrentUser) -> Json<UserProfile> {
    Json(current.user.profile())
}

/// Revoke the presented session. Idempotent: an absent or already-revoked
/// token still yields 204.
pub async fn logout<S>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke_session(&token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Administrative password reset for another user
pub async fn reset_password<S>(
    State(state): State<Arc<AppState<S>>>,
    _current: CurrentUser,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<UserProfile>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let user = state
        .credentials
        .reset_password(&req.user_id, req.new_password)
        .await?;
    Ok(Json(user.profile()))
}

/// Merge-update the caller's preferences
pub async fn update_preferences<S>(
    State(state): State<Arc<AppState<S>>>,
    current: CurrentUser,
    Json(update): Json<PreferencesUpdate>,
) -> Result<Json<UserProfile>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let user = state
        .credentials
        .update_preferences(&current.user.id, &update)
        .await?;
    Ok(Json(user.profile()))
}

/// Merge-update the caller's agent configuration
pub async fn update_agent_config<S>(
    State(state): State<Arc<AppState<S>>>,
    current: CurrentUser,
    Json(update): Json<AgentConfigUpdate>,
) -> Result<Json<UserProfile>, AppError>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let user = state
        .credentials
        .update_agent_config(&current.user.id, &update)
        .await?;
    Ok(Json(user.profile()))
}
