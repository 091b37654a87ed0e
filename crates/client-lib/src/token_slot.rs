// ============================
// atrium-client-lib/src/token_slot.rs
// ============================
//! Persistent storage for the session token.
//!
//! The native-client equivalent of the browser's session cookie: a
//! private file in the platform cache directory. Only the gate reads or
//! writes it; UI code never sees the raw token.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Token file name in the cache directory
const TOKEN_FILE: &str = "session-token";

/// Where the gate keeps the session token between runs
pub trait TokenSlot: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed token slot
pub struct FileTokenSlot {
    path: PathBuf,
}

impl FileTokenSlot {
    /// Place the token file under the platform cache directory
    pub fn in_cache_dir(app_name: &str) -> Result<Self> {
        let dir = dirs::cache_dir()
            .context("no cache directory available")?
            .join(app_name);
        Ok(Self {
            path: dir.join(TOKEN_FILE),
        })
    }

    /// Use an explicit path
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenSlot for FileTokenSlot {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        let token = contents.trim().to_string();
        Ok(if token.is_empty() { None } else { Some(token) })
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;

        // owner-only, like a secure cookie jar
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
