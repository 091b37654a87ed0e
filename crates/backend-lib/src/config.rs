// ============================
// atrium-backend-lib/src/config.rs
// ============================
//! Configuration management.
use crate::auth::PasswordRules;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default session lifetime: 30 days, absolute from issuance
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    /// Corporate email domain accepted at registration and login
    pub email_domain: String,
    /// Password requirements
    pub password_rules: PasswordRules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            email_domain: "atrium.io".to_string(),
            password_rules: PasswordRules::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default location, with env overrides
    pub fn load() -> Result<Self> {
        Self::extract(Toml::file("config.toml"))
    }

    /// Load settings from an explicit config file, with env overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::extract(Toml::file(path.as_ref()))
    }

    fn extract(file: impl Provider) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(file)
            .merge(Env::prefixed("ATRIUM_"))
            .extract()?;
        Ok(settings)
    }

    /// Session TTL as a [`Duration`]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.session_ttl_secs, 60 * 60 * 24 * 30);
        assert_eq!(settings.email_domain, "atrium.io");
        assert_eq!(settings.password_rules.min_length, 8);
        assert_eq!(settings.session_ttl(), Duration::from_secs(2_592_000));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let settings = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.log_level, "info");
    }
}
