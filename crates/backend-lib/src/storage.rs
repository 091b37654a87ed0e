// ============================
// atrium-backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
use async_trait::async_trait;
use atrium_common::{AgentConfig, Preferences, Role, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::fs as tokio_fs;

use crate::error::AppError;

/// Persisted user record. Server-side only; the password hash never
/// leaves this type except as a presence flag on [`UserProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    /// Stored lower-cased; unique across the store
    pub email: String,
    /// None until the first credential-setup event (invite/migration case)
    pub password_hash: Option<String>,
    /// None until profile completion
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub preferences: Preferences,
    pub agent_config: AgentConfig,
}

impl UserRecord {
    /// Public view of this record
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            has_password: self.password_hash.is_some(),
            preferences: self.preferences.clone(),
            agent_config: self.agent_config.clone(),
            created_at: self.created_at,
            last_active: self.last_active,
        }
    }
}

/// Persisted session record with an absolute expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Trait for storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a new user; fails with `DuplicateEmail` if the email is taken
    async fn create_user(&self, record: &UserRecord) -> Result<(), AppError>;

    async fn get_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Overwrite an existing user record
    async fn update_user(&self, record: &UserRecord) -> Result<(), AppError>;

    async fn put_session(&self, session: &SessionRecord) -> Result<(), AppError>;

    async fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, AppError>;

    /// Idempotent delete; removing an absent session is not an error
    async fn delete_session(&self, token: &str) -> Result<(), AppError>;
}

/// Flat-file implementation of the [`Storage`] trait.
///
/// Layout under the data root:
/// `users/<id>.json`, `email-index/<email>` (contains the user id),
/// `sessions/<token>.json`.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users"))?;
        fs::create_dir_all(root.join("email-index"))?;
        fs::create_dir_all(root.join("sessions"))?;
        Ok(Self { root })
    }

    fn user_path(&self, id: &str) -> PathBuf {
        self.root.join("users").join(format!("{id}.json"))
    }

    fn email_index_path(&self, email: &str) -> PathBuf {
        self.root.join("email-index").join(email)
    }

    fn session_path(&self, token: &str) -> PathBuf {
        self.root.join("sessions").join(format!("{token}.json"))
    }
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn create_user(&self, record: &UserRecord) -> Result<(), AppError> {
        let index = self.email_index_path(&record.email);
        if index.exists() {
            return Err(AppError::DuplicateEmail);
        }

        let json = serde_json::to_string_pretty(record)?;
        tokio_fs::write(self.user_path(&record.id), json).await?;
        tokio_fs::write(index, &record.id).await?;
        Ok(())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        let path = self.user_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio_fs::read_to_string(&path).await?;
        let record: UserRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let index = self.email_index_path(email);
        if !index.exists() {
            return Ok(None);
        }

        let id = tokio_fs::read_to_string(&index).await?;
        self.get_user_by_id(id.trim()).await
    }

    async fn update_user(&self, record: &UserRecord) -> Result<(), AppError> {
        let path = self.user_path(&record.id);
        if !path.exists() {
            return Err(AppError::NoSuchUser);
        }

        let json = serde_json::to_string_pretty(record)?;
        tokio_fs::write(path, json).await?;
        Ok(())
    }

    async fn put_session(&self, session: &SessionRecord) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(session)?;
        tokio_fs::write(self.session_path(&session.token), json).await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<SessionRecord>, AppError> {
        let path = self.session_path(token);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio_fs::read_to_string(&path).await?;
        let session: SessionRecord = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        let path = self.session_path(token);
        if path.exists() {
            tokio_fs::remove_file(path).await?;
        }
        Ok(())
    }
}
