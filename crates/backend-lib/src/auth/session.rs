// ============================
// atrium-backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use chrono::Utc;
use metrics::counter;
use std::time::Duration;

use crate::auth::token_generator::generate_secure_token;
use crate::error::AppError;
use crate::metrics::{SESSION_CREATED, SESSION_EXPIRED, SESSION_REVOKED};
use crate::storage::{SessionRecord, Storage, UserRecord};

/// Session TTL (time to live), absolute from issuance
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30); // 30 days

/// Session manager for handling authentication tokens.
///
/// Sessions are persisted through the storage backend with an absolute
/// expiry; nothing extends a session once issued. Expired sessions are
/// deleted lazily by whichever access discovers them.
#[derive(Clone)]
pub struct SessionManager<S> {
    storage: S,
    ttl: chrono::Duration,
}

impl<S: Storage> SessionManager<S> {
    /// Create a new session manager with the default 30-day TTL
    pub fn new(storage: S) -> Self {
        Self::with_ttl(storage, SESSION_TTL)
    }

    /// Create a new session manager with a custom TTL
    pub fn with_ttl(storage: S, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::days(30));
        Self { storage, ttl }
    }

    /// Create a new session for a user.
    ///
    /// Existing sessions for the same user are untouched; multiple
    /// concurrent sessions are allowed.
    pub async fn create_session(&self, user_id: &str) -> Result<SessionRecord, AppError> {
        let now = Utc::now();
        let session = SessionRecord {
            token: generate_secure_token(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.storage.put_session(&session).await?;
        counter!(SESSION_CREATED).increment(1);

        Ok(session)
    }

    /// Resolve a token to its user.
    ///
    /// Returns `None` for unknown tokens. An expired session is deleted
    /// before `None` is returned, so expired records never accumulate.
    /// Successful resolution refreshes the user's `last_active` as a
    /// best-effort side channel; a failure there never fails resolution.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<UserRecord>, AppError> {
        let Some(session) = self.storage.get_session(token).await? else {
            return Ok(None);
        };

        if session.is_expired() {
            self.storage.delete_session(token).await?;
            counter!(SESSION_EXPIRED).increment(1);
            return Ok(None);
        }

        let Some(mut user) = self.storage.get_user_by_id(&session.user_id).await? else {
            // session outlived its user; clean it up
            self.storage.delete_session(token).await?;
            return Ok(None);
        };

        user.last_active = Utc::now();
        if let Err(err) = self.storage.update_user(&user).await {
            tracing::warn!(user_id = %user.id, %err, "failed to refresh last_active");
        }

        Ok(Some(user))
    }

    /// Revoke a session. Idempotent; revoking an unknown token is fine.
    pub async fn revoke_session(&self, token: &str) -> Result<(), AppError> {
        self.storage.delete_session(token).await?;
        counter!(SESSION_REVOKED).increment(1);
        Ok(())
    }

    /// Resolve a token and issue a fresh session for the same user.
    ///
    /// The old session keeps its own absolute expiry; revoking or
    /// refreshing one session never affects another.
    pub async fn refresh_session(
        &self,
        token: &str,
    ) -> Result<Option<(SessionRecord, UserRecord)>, AppError> {
        let Some(user) = self.resolve_session(token).await? else {
            return Ok(None);
        };
        let session = self.create_session(&user.id).await?;
        Ok(Some((session, user)))
    }
}
