// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the Atrium client and server.
//! This module defines the user model, the profile-completion resolver,
//! and the auth API request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of the free-text agent instructions field
pub const MAX_CUSTOM_INSTRUCTIONS_LEN: usize = 500;

/// User role, assigned during profile completion
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Analyst,
    GeneralEmployee,
}

/// Which agent answers a query by default
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Quick,
    Deep,
}

/// Channels a user can be notified on
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Slack,
    InApp,
}

/// Daily window in which scheduled output may be delivered
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkingHours {
    /// Start of the window in "HH:MM" format
    pub start: String,
    /// End of the window in "HH:MM" format
    pub end: String,
    /// IANA timezone name
    pub timezone: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

/// Per-user preferences, created with the user and merged in place
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub default_agent_mode: AgentMode,
    /// Automatically upgrade a quick query to the deep agent
    pub auto_upgrade: bool,
    pub notification_channels: Vec<NotificationChannel>,
    pub working_hours: WorkingHours,
    /// Data source ids pinned by the user
    pub favorite_data_sources: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_agent_mode: AgentMode::Quick,
            auto_upgrade: false,
            notification_channels: vec![NotificationChannel::InApp],
            working_hours: WorkingHours::default(),
            favorite_data_sources: Vec::new(),
        }
    }
}

/// Agent personality presented in responses
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Professional,
    Friendly,
    Concise,
    Enthusiastic,
}

/// How much supporting detail a response carries
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStyle {
    Detailed,
    Balanced,
    Brief,
}

/// Target length of generated responses
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLength {
    Short,
    Medium,
    Long,
}

/// Per-user agent tuning, created with the user and merged in place
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub personality: Personality,
    pub response_style: ResponseStyle,
    /// 0..=100
    pub creativity: u8,
    pub response_length: ResponseLength,
    /// Free text, at most [`MAX_CUSTOM_INSTRUCTIONS_LEN`] characters
    pub custom_instructions: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            personality: Personality::Professional,
            response_style: ResponseStyle::Balanced,
            creativity: 50,
            response_length: ResponseLength::Medium,
            custom_instructions: None,
        }
    }
}

/// Partial update for [`Preferences`]; absent fields are left untouched
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub default_agent_mode: Option<AgentMode>,
    pub auto_upgrade: Option<bool>,
    pub notification_channels: Option<Vec<NotificationChannel>>,
    pub working_hours: Option<WorkingHours>,
    pub favorite_data_sources: Option<Vec<String>>,
}

impl PreferencesUpdate {
    /// Merge the supplied fields into `prefs`, leaving the rest alone
    pub fn apply_to(&self, prefs: &mut Preferences) {
        if let Some(mode) = self.default_agent_mode {
            prefs.default_agent_mode = mode;
        }
        if let Some(auto) = self.auto_upgrade {
            prefs.auto_upgrade = auto;
        }
        if let Some(channels) = &self.notification_channels {
            prefs.notification_channels = channels.clone();
        }
        if let Some(hours) = &self.working_hours {
            prefs.working_hours = hours.clone();
        }
        if let Some(sources) = &self.favorite_data_sources {
            prefs.favorite_data_sources = sources.clone();
        }
    }
}

/// Partial update for [`AgentConfig`]; absent fields are left untouched
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AgentConfigUpdate {
    pub personality: Option<Personality>,
    pub response_style: Option<ResponseStyle>,
    pub creativity: Option<u8>,
    pub response_length: Option<ResponseLength>,
    pub custom_instructions: Option<String>,
}

impl AgentConfigUpdate {
    /// Merge the supplied fields into `config`, leaving the rest alone
    pub fn apply_to(&self, config: &mut AgentConfig) {
        if let Some(personality) = self.personality {
            config.personality = personality;
        }
        if let Some(style) = self.response_style {
            config.response_style = style;
        }
        if let Some(creativity) = self.creativity {
            config.creativity = creativity;
        }
        if let Some(length) = self.response_length {
            config.response_length = length;
        }
        if let Some(instructions) = &self.custom_instructions {
            config.custom_instructions = Some(instructions.clone());
        }
    }
}

/// Public view of a user. The password hash never crosses the wire;
/// only its presence is exposed, which is what the resolver needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: Option<Role>,
    pub has_password: bool,
    pub preferences: Preferences,
    pub agent_config: AgentConfig,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Lifecycle state of a user account, always derived, never stored
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    NeedsPasswordSetup,
    NeedsProfileSetup,
    Ready,
}

/// Classify a user into exactly one lifecycle state.
///
/// The password check takes precedence: a freshly invited user is missing
/// both fields, and no profile should be attached to a still-passwordless
/// account.
pub fn completion_state(user: &UserProfile) -> CompletionState {
    if !user.has_password {
        CompletionState::NeedsPasswordSetup
    } else if user.role.is_none() {
        CompletionState::NeedsProfileSetup
    } else {
        CompletionState::Ready
    }
}

/// Machine-readable failure reasons carried in error response bodies
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthFailureReason {
    NoSuchUser,
    NoPasswordSet,
    WrongPassword,
    WeakPassword,
    DuplicateEmail,
    InvalidEmail,
    InvalidSession,
    RateLimited,
}

impl AuthFailureReason {
    /// The wire code for this reason
    pub fn as_code(self) -> &'static str {
        match self {
            Self::NoSuchUser => "NO_SUCH_USER",
            Self::NoPasswordSet => "NO_PASSWORD_SET",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidSession => "INVALID_SESSION",
            Self::RateLimited => "RATE_LIMITED",
        }
    }

    /// Parse a wire code back into a reason
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NO_SUCH_USER" => Some(Self::NoSuchUser),
            "NO_PASSWORD_SET" => Some(Self::NoPasswordSet),
            "WRONG_PASSWORD" => Some(Self::WrongPassword),
            "WEAK_PASSWORD" => Some(Self::WeakPassword),
            "DUPLICATE_EMAIL" => Some(Self::DuplicateEmail),
            "INVALID_EMAIL" => Some(Self::InvalidEmail),
            "INVALID_SESSION" => Some(Self::InvalidSession),
            "RATE_LIMITED" => Some(Self::RateLimited),
            _ => None,
        }
    }
}

// ---- request/response payloads ----

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetPasswordRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CompleteProfileRequest {
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub preferences: Option<PreferencesUpdate>,
    #[serde(default)]
    pub agent_config: Option<AgentConfigUpdate>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub user_id: String,
    pub new_password: String,
}

/// Session token plus the user it authenticates
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Error body shape produced by the server and parsed by the client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn resolver_covers_all_field_combinations() {
        // Password presence takes precedence over role presence.
        assert_eq!(
            completion_state(&profile(false, None)),
            CompletionState::NeedsPasswordSetup
        );
        assert_eq!(
            completion_state(&profile(false, Some(Role::Analyst))),
            CompletionState::NeedsPasswordSetup
        );
        assert_eq!(
            completion_state(&profile(true, None)),
            CompletionState::NeedsProfileSetup
        );
        assert_eq!(
            completion_state(&profile(true, Some(Role::GeneralEmployee))),
            CompletionState::Ready
        );
    }

    #[test]
    fn preferences_merge_leaves_omitted_fields_untouched() {
        let mut prefs = Preferences {
            favorite_data_sources: vec!["events.daily".to_string()],
            ..Default::default()
        };

        let update = PreferencesUpdate {
            default_agent_mode: Some(AgentMode::Deep),
            auto_upgrade: Some(true),
            ..Default::default()
        };
        update.apply_to(&mut prefs);

        assert_eq!(prefs.default_agent_mode, AgentMode::Deep);
        assert!(prefs.auto_upgrade);
        // untouched
        assert_eq!(prefs.favorite_data_sources, vec!["events.daily".to_string()]);
        assert_eq!(prefs.notification_channels, vec![NotificationChannel::InApp]);
        assert_eq!(prefs.working_hours, WorkingHours::default());
    }

    #[test]
    fn agent_config_merge_leaves_omitted_fields_untouched() {
        let mut config = AgentConfig::default();
        let update = AgentConfigUpdate {
            creativity: Some(80),
            custom_instructions: Some("Prefer tables over prose".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut config);

        assert_eq!(config.creativity, 80);
        assert_eq!(
            config.custom_instructions.as_deref(),
            Some("Prefer tables over prose")
        );
        assert_eq!(config.personality, Personality::Professional);
        assert_eq!(config.response_length, ResponseLength::Medium);
    }

    #[test]
    fn role_and_reason_wire_formats() {
        assert_eq!(
            serde_json::to_string(&Role::GeneralEmployee).unwrap(),
            "\"general_employee\""
        );
        assert_eq!(serde_json::to_string(&AgentMode::Quick).unwrap(), "\"quick\"");
        assert_eq!(
            AuthFailureReason::from_code("NO_PASSWORD_SET"),
            Some(AuthFailureReason::NoPasswordSet)
        );
        assert_eq!(AuthFailureReason::from_code("NOPE"), None);
        assert_eq!(AuthFailureReason::WrongPassword.as_code(), "WRONG_PASSWORD");
    }
}
