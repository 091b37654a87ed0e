// ============================
// atrium-backend-lib/src/lib.rs
// ============================
//! Server core for the Atrium identity and session subsystem.

pub mod api_router;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthRateLimiter, CredentialStore, SessionManager};
use crate::config::Settings;
use crate::storage::Storage;

/// Application state shared across all handlers.
///
/// Built once at startup and passed by handle into the router; handlers
/// never reach for ambient globals.
pub struct AppState<S> {
    /// Credential store
    pub credentials: CredentialStore<S>,
    /// Session manager
    pub sessions: SessionManager<S>,
    /// Settings
    pub settings: Arc<Settings>,
    /// Failed-login rate limiter
    pub auth_limiter: Arc<AuthRateLimiter>,
}

impl<S: Storage + Clone> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, settings: Settings) -> Self {
        let credentials = CredentialStore::new(
            storage.clone(),
            settings.email_domain.clone(),
            settings.password_rules.clone(),
        );
        let sessions = SessionManager::with_ttl(storage, settings.session_ttl());

        Self {
            credentials,
            sessions,
            settings: Arc::new(settings),
            auth_limiter: Arc::new(AuthRateLimiter::default()),
        }
    }
}
