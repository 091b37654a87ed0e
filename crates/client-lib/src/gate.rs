// ============================
// atrium-client-lib/src/gate.rs
// ============================
//! The auth gate: the single client-side state machine every other view
//! depends on to know who the user is and which screen to show.

use tokio::sync::{Mutex, RwLock};

use atrium_common::{
    completion_state, AgentConfigUpdate, AuthFailureReason, AuthResponse,
    CompleteProfileRequest, CompletionState, PreferencesUpdate, Role, UserProfile,
};

use crate::api::{ApiError, AuthApi};
use crate::error::{map_api_error, GateError};
use crate::token_slot::TokenSlot;

/// The mutually exclusive UI modes
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Loading,
    LoggedOut,
    NeedsPasswordSetup { email: String },
    NeedsProfileSetup { email: String },
    Authenticated { user: UserProfile },
}

impl AuthState {
    /// The resolved user, when authenticated
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }
}

/// Client-side authentication state machine.
///
/// Single-writer: mutating operations serialize through an internal
/// lock, so a new triggering event is only acted on after the prior one
/// resolves and no transition is computed from a stale snapshot. Every
/// post-operation state is re-derived from the authoritative server
/// response, never assumed locally.
///
/// Transport failures leave the state untouched and surface a retryable
/// [`GateError::Transport`]; an invalid or expired session transitions
/// silently to `LoggedOut`.
pub struct AuthGate<A, T> {
    api: A,
    slot: T,
    state: RwLock<AuthState>,
    op: Mutex<()>,
}

impl<A: AuthApi, T: TokenSlot> AuthGate<A, T> {
    /// Create a gate in the `Loading` state; call [`initialize`] to
    /// resolve any stored token.
    ///
    /// [`initialize`]: AuthGate::initialize
    pub fn new(api: A, slot: T) -> Self {
        Self {
            api,
            slot,
            state: RwLock::new(AuthState::Loading),
            op: Mutex::new(()),
        }
    }

    /// Current state snapshot
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// The resolved user, when authenticated
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.state.read().await.user().cloned()
    }

    async fn set_state(&self, next: AuthState) -> AuthState {
        *self.state.write().await = next.clone();
        next
    }

    fn load_token(&self) -> Option<String> {
        match self.slot.load() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(%err, "failed to read token slot");
                None
            },
        }
    }

    fn store_token(&self, token: &str) {
        if let Err(err) = self.slot.store(token) {
            tracing::warn!(%err, "failed to persist session token");
        }
    }

    fn clear_token(&self) {
        if let Err(err) = self.slot.clear() {
            tracing::warn!(%err, "failed to clear session token");
        }
    }

    /// Derive the UI state from an authoritative user snapshot
    fn state_from_profile(user: UserProfile) -> AuthState {
        match completion_state(&user) {
            CompletionState::NeedsPasswordSetup => AuthState::NeedsPasswordSetup {
                email: user.email,
            },
            CompletionState::NeedsProfileSetup => AuthState::NeedsProfileSetup {
                email: user.email,
            },
            CompletionState::Ready => AuthState::Authenticated { user },
        }
    }

    /// Persist the token and derive the next state from the returned
    /// user via the completion resolver
    async fn apply(&self, response: AuthResponse) -> AuthState {
        self.store_token(&response.token);
        self.set_state(Self::state_from_profile(response.user)).await
    }

    /// Resolve the stored token on startup.
    ///
    /// No token or an invalid one lands in `LoggedOut`; a transport
    /// failure keeps `Loading` so the caller can retry.
    pub async fn initialize(&self) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        let Some(token) = self.load_token() else {
            return Ok(self.set_state(AuthState::LoggedOut).await);
        };

        match self.api.validate(&token).await {
            Ok(response) => Ok(self.apply(response).await),
            Err(ApiError::Failure(AuthFailureReason::InvalidSession)) => {
                self.clear_token();
                Ok(self.set_state(AuthState::LoggedOut).await)
            },
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Submit a login attempt.
    ///
    /// `NoPasswordSet` is not a failure: it routes the user into the
    /// password-setup flow.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        match self.api.login(email, password).await {
            Ok(response) => Ok(self.apply(response).await),
            Err(ApiError::Failure(AuthFailureReason::NoPasswordSet)) => {
                let next = AuthState::NeedsPasswordSetup {
                    email: email.trim().to_lowercase(),
                };
                Ok(self.set_state(next).await)
            },
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Register a new account and enter the profile-setup screen.
    /// Profile comes first on this path; the resolver routes to password
    /// setup right after the profile is submitted.
    pub async fn register(&self, email: &str) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        match self.api.register(email).await {
            Ok(response) => {
                self.store_token(&response.token);
                let next = AuthState::NeedsProfileSetup {
                    email: response.user.email,
                };
                Ok(self.set_state(next).await)
            },
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Complete the password-setup step
    pub async fn set_password(&self, password: &str) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        let email = match &*self.state.read().await {
            AuthState::NeedsPasswordSetup { email } => email.clone(),
            _ => {
                return Err(GateError::Validation(
                    "no password setup in progress".to_string(),
                ))
            },
        };

        match self.api.set_password(&email, password).await {
            Ok(response) => Ok(self.apply(response).await),
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Complete the profile-setup step
    pub async fn complete_setup(
        &self,
        role: Role,
        preferences: Option<PreferencesUpdate>,
        agent_config: Option<AgentConfigUpdate>,
    ) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        let email = match &*self.state.read().await {
            AuthState::NeedsProfileSetup { email } => email.clone(),
            _ => {
                return Err(GateError::Validation(
                    "no profile setup in progress".to_string(),
                ))
            },
        };

        let request = CompleteProfileRequest {
            email,
            role,
            preferences,
            agent_config,
        };

        match self.api.complete_profile(&request).await {
            Ok(response) => Ok(self.apply(response).await),
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Re-resolve the authoritative state from the server.
    ///
    /// This is the explicit refresh triggered by completing operations
    /// elsewhere in the app; a session that turned invalid mid-flight is
    /// treated as a routine logout, not an error.
    pub async fn refresh_user(&self) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        let Some(token) = self.load_token() else {
            return Ok(self.set_state(AuthState::LoggedOut).await);
        };

        match self.api.current_user(&token).await {
            Ok(user) => Ok(self.set_state(Self::state_from_profile(user)).await),
            Err(ApiError::Failure(AuthFailureReason::InvalidSession)) => {
                self.clear_token();
                Ok(self.set_state(AuthState::LoggedOut).await)
            },
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Rotate the session token. The old session keeps its own absolute
    /// expiry server-side; only the slot's token changes here.
    pub async fn renew_session(&self) -> Result<AuthState, GateError> {
        let _op = self.op.lock().await;

        let Some(token) = self.load_token() else {
            return Ok(self.set_state(AuthState::LoggedOut).await);
        };

        match self.api.refresh(&token).await {
            Ok(response) => Ok(self.apply(response).await),
            Err(ApiError::Failure(AuthFailureReason::InvalidSession)) => {
                self.clear_token();
                Ok(self.set_state(AuthState::LoggedOut).await)
            },
            Err(err) => Err(map_api_error(err)),
        }
    }

    /// Log out: revoke the session server-side (best effort; revocation
    /// is idempotent), clear the token slot, land in `LoggedOut`.
    pub async fn logout(&self) -> AuthState {
        let _op = self.op.lock().await;

        if let Some(token) = self.load_token() {
            if let Err(err) = self.api.logout(&token).await {
                tracing::warn!(%err, "logout request failed; clearing local session anyway");
            }
        }

        self.clear_token();
        self.set_state(AuthState::LoggedOut).await
    }
}
