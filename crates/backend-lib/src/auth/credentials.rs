// ============================
// atrium-backend-lib/src/auth/credentials.rs
// ============================
//! Credential store: user creation, authentication, password and
//! profile updates.
use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use atrium_common::{
    AgentConfig, AgentConfigUpdate, Preferences, PreferencesUpdate, Role,
    MAX_CUSTOM_INSTRUCTIONS_LEN,
};

use crate::auth::password::{
    hash_password_secure, validate_password_strength, verify_password, PasswordRules,
};
use crate::error::AppError;
use crate::metrics::USER_CREATED;
use crate::storage::{Storage, UserRecord};
use crate::validation;

/// Credential store over a storage backend.
///
/// Constructed once per process and passed by handle; nothing in here is
/// reachable through ambient globals.
#[derive(Clone)]
pub struct CredentialStore<S> {
    storage: S,
    email_domain: String,
    rules: PasswordRules,
}

impl<S: Storage> CredentialStore<S> {
    pub fn new(storage: S, email_domain: impl Into<String>, rules: PasswordRules) -> Self {
        Self {
            storage,
            email_domain: email_domain.into(),
            rules,
        }
    }

    /// Pure predicate: does this email belong to the organization?
    pub fn validate_email_domain(&self, email: &str) -> bool {
        validation::email_has_domain(email, &self.email_domain)
    }

    /// Validate shape + domain and return the canonical (lower-cased) form
    fn canonical_email(&self, email: &str) -> Result<String, AppError> {
        let email = email.trim();
        validation::validate_email(email)?;
        if !self.validate_email_domain(email) {
            return Err(AppError::InvalidEmail(format!(
                "Only @{} email addresses are allowed",
                self.email_domain
            )));
        }
        Ok(email.to_lowercase())
    }

    /// Create a user. Fails with `DuplicateEmail` if the email is taken
    /// and `InvalidEmail` if it is outside the organization's domain.
    ///
    /// Invited users are created with no password and no role; the
    /// lifecycle state machine walks them through both setup steps.
    pub async fn create_user(
        &self,
        email: &str,
        role: Option<Role>,
        preferences: Option<Preferences>,
        agent_config: Option<AgentConfig>,
    ) -> Result<UserRecord, AppError> {
        let email = self.canonical_email(email)?;

        let agent_config = agent_config.unwrap_or_default();
        validate_agent_config(&agent_config)?;

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash: None,
            role,
            created_at: now,
            last_active: now,
            preferences: preferences.unwrap_or_default(),
            agent_config,
        };

        self.storage.create_user(&record).await?;
        counter!(USER_CREATED).increment(1);
        tracing::info!(user_id = %record.id, "user created");

        Ok(record)
    }

    /// Authenticate by email and password.
    ///
    /// The three failures stay distinct because `NoPasswordSet` routes
    /// the caller into the password-setup flow instead of a generic
    /// credentials error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRecord, AppError> {
        let email = self.canonical_email(email)?;

        let user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or(AppError::NoSuchUser)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AppError::NoPasswordSet);
        };

        if !verify_password(hash, password) {
            return Err(AppError::WrongPassword);
        }

        Ok(user)
    }

    /// Set a password by email, creating the user when absent.
    ///
    /// This is the migration flow: bulk-invited users arrive here before
    /// any record exists for them. Overwrites a prior hash when present.
    pub async fn set_password(
        &self,
        email: &str,
        mut password: String,
    ) -> Result<UserRecord, AppError> {
        let email = self.canonical_email(email)?;

        if !validate_password_strength(&password, &self.rules) {
            return Err(AppError::WeakPassword);
        }

        let existing = self.storage.get_user_by_email(&email).await?;
        let mut user = match existing {
            Some(user) => user,
            None => self.create_user(&email, None, None, None).await?,
        };

        user.password_hash = Some(hash_password_secure(&mut password)?);
        self.storage.update_user(&user).await?;
        tracing::info!(user_id = %user.id, "password set");

        Ok(user)
    }

    /// Administrative reset: set a new password on an existing user
    pub async fn reset_password(
        &self,
        user_id: &str,
        mut new_password: String,
    ) -> Result<UserRecord, AppError> {
        if !validate_password_strength(&new_password, &self.rules) {
            return Err(AppError::WeakPassword);
        }

        let mut user = self
            .storage
            .get_user_by_id(user_id)
            .await?
            .ok_or(AppError::NoSuchUser)?;

        user.password_hash = Some(hash_password_secure(&mut new_password)?);
        self.storage.update_user(&user).await?;
        tracing::info!(user_id = %user.id, "password reset");

        Ok(user)
    }

    /// Complete a user's profile: assign the role and apply any supplied
    /// preference/agent-config updates.
    pub async fn complete_profile(
        &self,
        email: &str,
        role: Role,
        preferences: Option<&PreferencesUpdate>,
        agent_config: Option<&AgentConfigUpdate>,
    ) -> Result<UserRecord, AppError> {
        let email = self.canonical_email(email)?;

        let mut user = self
            .storage
            .get_user_by_email(&email)
            .await?
            .ok_or(AppError::NoSuchUser)?;

        user.role = Some(role);
        if let Some(update) = preferences {
            update.apply_to(&mut user.preferences);
        }
        if let Some(update) = agent_config {
            update.apply_to(&mut user.agent_config);
            validate_agent_config(&user.agent_config)?;
        }

        self.storage.update_user(&user).await?;
        tracing::info!(user_id = %user.id, role = ?role, "profile completed");

        Ok(user)
    }

    /// Merge-update a user's preferences; omitted fields are untouched
    pub async fn update_preferences(
        &self,
        user_id: &str,
        update: &PreferencesUpdate,
    ) -> Result<UserRecord, AppError> {
        let mut user = self
            .storage
            .get_user_by_id(user_id)
            .await?
            .ok_or(AppError::NoSuchUser)?;

        update.apply_to(&mut user.preferences);
        self.storage.update_user(&user).await?;

        Ok(user)
    }

    /// Merge-update a user's agent configuration; omitted fields are
    /// untouched
    pub async fn update_agent_config(
        &self,
        user_id: &str,
        update: &AgentConfigUpdate,
    ) -> Result<UserRecord, AppError> {
        let mut user = self
            .storage
            .get_user_by_id(user_id)
            .await?
            .ok_or(AppError::NoSuchUser)?;

        update.apply_to(&mut user.agent_config);
        validate_agent_config(&user.agent_config)?;
        self.storage.update_user(&user).await?;

        Ok(user)
    }
}

/// Bounds check for agent configuration
fn validate_agent_config(config: &AgentConfig) -> Result<(), AppError> {
    if config.creativity > 100 {
        return Err(AppError::InvalidInput(
            "Creativity must be between 0 and 100".to_string(),
        ));
    }

    if let Some(instructions) = &config.custom_instructions {
        if instructions.chars().count() > MAX_CUSTOM_INSTRUCTIONS_LEN {
            return Err(AppError::InvalidInput(format!(
                "Custom instructions cannot exceed {MAX_CUSTOM_INSTRUCTIONS_LEN} characters"
            )));
        }
    }

    Ok(())
}
