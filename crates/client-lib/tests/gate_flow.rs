//! State-machine tests for the auth gate, driven through a scripted mock
//! of the backend API.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use atrium_client_lib::api::{ApiError, AuthApi};
use atrium_client_lib::gate::{AuthGate, AuthState};
use atrium_client_lib::token_slot::TokenSlot;
use atrium_common::{
    AgentConfig, AuthFailureReason, AuthResponse, CompleteProfileRequest, Preferences, Role,
    UserProfile,
};
use chrono::Utc;

// ---- test doubles ----

/// In-memory token slot
#[derive(Default)]
struct MemorySlot {
    token: Mutex<Option<String>>,
}

impl TokenSlot for MemorySlot {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn store(&self, token: &str) -> anyhow::Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// Scripted API double: every call pops the next queued response
#[derive(Default)]
struct MockApi {
    script: Mutex<VecDeque<Result<AuthResponse, ApiError>>>,
    logout_calls: AtomicUsize,
}

impl MockApi {
    fn push(&self, response: Result<AuthResponse, ApiError>) {
        self.script.lock().unwrap().push_back(response);
    }

    fn next(&self) -> Result<AuthResponse, ApiError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("mock api called more times than scripted")
    }
}

#[async_trait]
impl AuthApi for MockApi {
    async fn login(&self, _email: &str, _password: &str) -> Result<AuthResponse, ApiError> {
        self.next()
    }

    async fn register(&self, _email: &str) -> Result<AuthResponse, ApiError> {
        self.next()
    }

    async fn set_password(&self, _email: &str, _password: &str) -> Result<AuthResponse, ApiError> {
        self.next()
    }

    async fn complete_profile(
        &self,
        _request: &CompleteProfileRequest,
    ) -> Result<AuthResponse, ApiError> {
        self.next()
    }

    async fn validate(&self, _token: &str) -> Result<AuthResponse, ApiError> {
        self.next()
    }

    async fn refresh(&self, _token: &str) -> Result<AuthResponse, ApiError> {
        self.next()
    }

    async fn current_user(&self, _token: &str) -> Result<UserProfile, ApiError> {
        self.next().map(|response| response.user)
    }

    async fn logout(&self, _token: &str) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn profile(has_password: bool, role: Option<Role>) -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        email: "ana@atrium.io".to_string(),
        role,
        has_password,
        preferences: Preferences::default(),
        agent_config: AgentConfig::default(),
        created_at: Utc::now(),
        last_active: Utc::now(),
    }
}

fn ok(token: &str, user: UserProfile) -> Result<AuthResponse, ApiError> {
    Ok(AuthResponse {
        token: token.to_string(),
        user,
    })
}

fn gate_with(api: MockApi, slot: MemorySlot) -> AuthGate<MockApi, MemorySlot> {
    AuthGate::new(api, slot)
}

// ---- startup resolution ----

#[tokio::test]
async fn initialize_without_token_lands_logged_out() {
    let gate = gate_with(MockApi::default(), MemorySlot::default());
    assert_eq!(gate.state().await, AuthState::Loading);

    let state = gate.initialize().await.unwrap();
    assert_eq!(state, AuthState::LoggedOut);
}

#[tokio::test]
async fn initialize_with_valid_token_lands_authenticated() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(true, Some(Role::Analyst))));

    let slot = MemorySlot::default();
    slot.store("tok-1").unwrap();

    let gate = gate_with(api, slot);
    let state = gate.initialize().await.unwrap();
    assert!(state.is_authenticated());
    assert_eq!(gate.current_user().await.unwrap().email, "ana@atrium.io");
}

#[tokio::test]
async fn initialize_routes_half_set_up_users_to_the_right_screen() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(false, None)));

    let slot = MemorySlot::default();
    slot.store("tok-1").unwrap();

    let gate = gate_with(api, slot);
    let state = gate.initialize().await.unwrap();
    assert_eq!(
        state,
        AuthState::NeedsPasswordSetup {
            email: "ana@atrium.io".to_string()
        }
    );
}

#[tokio::test]
async fn initialize_with_expired_token_clears_the_slot() {
    let api = MockApi::default();
    api.push(Err(ApiError::Failure(AuthFailureReason::InvalidSession)));

    let slot = MemorySlot::default();
    slot.store("tok-stale").unwrap();

    let gate = gate_with(api, slot);
    let state = gate.initialize().await.unwrap();
    assert_eq!(state, AuthState::LoggedOut);

    // detected invalidity cleared the persisted token: a re-resolution
    // finds no token and never reaches the (empty) scripted API
    let state = gate.refresh_user().await.unwrap();
    assert_eq!(state, AuthState::LoggedOut);
}

#[tokio::test]
async fn initialize_keeps_loading_on_transport_failure() {
    let api = MockApi::default();
    api.push(Err(ApiError::Timeout));
    // scripted success for the retry
    api.push(ok("tok-1", profile(true, Some(Role::Analyst))));

    let slot = MemorySlot::default();
    slot.store("tok-1").unwrap();

    let gate = gate_with(api, slot);
    let err = gate.initialize().await.unwrap_err();
    assert!(err.is_retryable());
    // pre-call state is retained
    assert_eq!(gate.state().await, AuthState::Loading);

    // the retry succeeds without any state having been lost
    let state = gate.initialize().await.unwrap();
    assert!(state.is_authenticated());
}

// ---- login ----

#[tokio::test]
async fn login_success_lands_authenticated() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(true, Some(Role::GeneralEmployee))));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();

    let state = gate.login("ana@atrium.io", "abc12345").await.unwrap();
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn login_with_no_password_routes_to_password_setup() {
    let api = MockApi::default();
    api.push(Err(ApiError::Failure(AuthFailureReason::NoPasswordSet)));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();

    let state = gate.login("Ana@Atrium.IO", "whatever1").await.unwrap();
    assert_eq!(
        state,
        AuthState::NeedsPasswordSetup {
            email: "ana@atrium.io".to_string()
        }
    );
}

#[tokio::test]
async fn wrong_password_keeps_state_and_reads_generically() {
    let api = MockApi::default();
    api.push(Err(ApiError::Failure(AuthFailureReason::WrongPassword)));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();

    let err = gate.login("ana@atrium.io", "nope12345").await.unwrap_err();
    assert_eq!(err.to_string(), "Authentication failed");
    assert_eq!(gate.state().await, AuthState::LoggedOut);
}

#[tokio::test]
async fn transport_failure_during_login_changes_nothing() {
    let api = MockApi::default();
    api.push(Err(ApiError::Transport("connection refused".to_string())));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();

    let err = gate.login("ana@atrium.io", "abc12345").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(gate.state().await, AuthState::LoggedOut);
}

// ---- the two-step setup flows ----

#[tokio::test]
async fn invited_user_walks_password_then_profile() {
    let api = MockApi::default();
    // login discovers the migration case
    api.push(Err(ApiError::Failure(AuthFailureReason::NoPasswordSet)));
    // set-password succeeds; role still missing
    api.push(ok("tok-1", profile(true, None)));
    // complete-profile finishes the account
    api.push(ok("tok-2", profile(true, Some(Role::Analyst))));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();

    let state = gate.login("ana@atrium.io", "abc12345").await.unwrap();
    assert!(matches!(state, AuthState::NeedsPasswordSetup { .. }));

    let state = gate.set_password("abc12345").await.unwrap();
    assert!(matches!(state, AuthState::NeedsProfileSetup { .. }));

    let state = gate
        .complete_setup(Role::Analyst, None, None)
        .await
        .unwrap();
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn self_service_registration_walks_profile_then_password() {
    let api = MockApi::default();
    // register creates a bare account
    api.push(ok("tok-1", profile(false, None)));
    // profile completed; the resolver routes to password setup next
    api.push(ok("tok-2", profile(false, Some(Role::GeneralEmployee))));
    // password set; account ready
    api.push(ok("tok-3", profile(true, Some(Role::GeneralEmployee))));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();

    let state = gate.register("ana@atrium.io").await.unwrap();
    assert_eq!(
        state,
        AuthState::NeedsProfileSetup {
            email: "ana@atrium.io".to_string()
        }
    );

    let state = gate
        .complete_setup(Role::GeneralEmployee, None, None)
        .await
        .unwrap();
    assert!(matches!(state, AuthState::NeedsPasswordSetup { .. }));

    let state = gate.set_password("abc12345").await.unwrap();
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn setup_steps_require_their_own_screen() {
    let gate = gate_with(MockApi::default(), MemorySlot::default());
    gate.initialize().await.unwrap();

    // no setup in progress: both operations refuse without calling out
    let err = gate.set_password("abc12345").await.unwrap_err();
    assert!(matches!(
        err,
        atrium_client_lib::GateError::Validation(_)
    ));

    let err = gate
        .complete_setup(Role::Analyst, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        atrium_client_lib::GateError::Validation(_)
    ));
}

// ---- mid-session resolution and logout ----

#[tokio::test]
async fn refresh_detecting_invalid_session_logs_out_silently() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(true, Some(Role::Analyst))));
    api.push(Err(ApiError::Failure(AuthFailureReason::InvalidSession)));

    let slot = MemorySlot::default();
    slot.store("tok-1").unwrap();

    let gate = gate_with(api, slot);
    gate.initialize().await.unwrap();
    assert!(gate.state().await.is_authenticated());

    // token expired mid-session: not an error, just LoggedOut
    let state = gate.refresh_user().await.unwrap();
    assert_eq!(state, AuthState::LoggedOut);
}

#[tokio::test]
async fn refresh_transport_failure_keeps_the_session() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(true, Some(Role::Analyst))));
    api.push(Err(ApiError::Timeout));

    let slot = MemorySlot::default();
    slot.store("tok-1").unwrap();

    let gate = gate_with(api, slot);
    gate.initialize().await.unwrap();

    let err = gate.refresh_user().await.unwrap_err();
    assert!(err.is_retryable());
    // still authenticated; no forced logout on a flaky network
    assert!(gate.state().await.is_authenticated());
}

#[tokio::test]
async fn renew_rotates_the_token_without_changing_state() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(true, Some(Role::Analyst))));
    api.push(ok("tok-2", profile(true, Some(Role::Analyst))));

    let slot = MemorySlot::default();
    slot.store("tok-1").unwrap();

    let gate = gate_with(api, slot);
    gate.initialize().await.unwrap();

    let state = gate.renew_session().await.unwrap();
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn logout_revokes_and_clears() {
    let api = MockApi::default();
    api.push(ok("tok-1", profile(true, Some(Role::Analyst))));

    let gate = gate_with(api, MemorySlot::default());
    gate.initialize().await.unwrap();
    gate.login("ana@atrium.io", "abc12345").await.unwrap();

    let state = gate.logout().await;
    assert_eq!(state, AuthState::LoggedOut);
    assert!(gate.current_user().await.is_none());

    // logging out again is harmless (no token left to revoke)
    let state = gate.logout().await;
    assert_eq!(state, AuthState::LoggedOut);
}
