// ============================
// atrium-backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for authentication attempts.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of failed attempts before rate limiting
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// Whether the key is currently locked out
    is_locked_out: bool,
    /// When the lockout expires
    lockout_expiry: Option<Instant>,
}

/// Rate limiter for authentication attempts, keyed by login email
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    /// Map of login keys to rate limit entries
    attempts: Arc<DashMap<String, RateLimitEntry>>,
    /// Maximum number of failed attempts before lockout
    max_attempts: u32,
    /// Duration of lockout period
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl AuthRateLimiter {
    /// Create a new auth rate limiter
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    /// Record a failed authentication attempt
    pub fn record_failed_attempt(&self, key: &str) {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                failed_attempts: 0,
                last_failure: now,
                is_locked_out: false,
                lockout_expiry: None,
            });

        // Reset if an earlier lockout has expired
        if let Some(expiry) = entry.lockout_expiry {
            if now > expiry {
                entry.is_locked_out = false;
                entry.failed_attempts = 0;
                entry.lockout_expiry = None;
            }
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts {
            entry.is_locked_out = true;
            entry.lockout_expiry = Some(now + self.lockout_duration);

            tracing::warn!(%key, "authentication lockout engaged");
        }
    }

    /// Record a successful authentication
    pub fn record_success(&self, key: &str) {
        // On successful auth, remove the entry
        self.attempts.remove(key);
    }

    /// Check if a key is allowed to attempt authentication
    pub fn check_rate_limit(&self, key: &str) -> bool {
        if let Some(entry) = self.attempts.get(key) {
            if entry.is_locked_out {
                if let Some(expiry) = entry.lockout_expiry {
                    if Instant::now() < expiry {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Clean up expired lockouts
    pub fn cleanup(&self) {
        let now = Instant::now();

        self.attempts.retain(|_, entry| {
            if entry.is_locked_out {
                if let Some(expiry) = entry.lockout_expiry {
                    return now < expiry;
                }
            }

            // Otherwise, keep entries for a day
            now.duration_since(entry.last_failure) < Duration::from_secs(24 * 60 * 60)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockout_engages_after_max_attempts() {
        let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check_rate_limit("ana@atrium.io"));
        limiter.record_failed_attempt("ana@atrium.io");
        limiter.record_failed_attempt("ana@atrium.io");
        assert!(limiter.check_rate_limit("ana@atrium.io"));

        limiter.record_failed_attempt("ana@atrium.io");
        assert!(!limiter.check_rate_limit("ana@atrium.io"));

        // other keys are unaffected
        assert!(limiter.check_rate_limit("ben@atrium.io"));
    }

    #[test]
    fn success_clears_the_slate() {
        let limiter = AuthRateLimiter::new(3, Duration::from_secs(60));

        limiter.record_failed_attempt("ana@atrium.io");
        limiter.record_failed_attempt("ana@atrium.io");
        limiter.record_success("ana@atrium.io");

        limiter.record_failed_attempt("ana@atrium.io");
        assert!(limiter.check_rate_limit("ana@atrium.io"));
    }

    #[test]
    fn lockout_expires() {
        let limiter = AuthRateLimiter::new(1, Duration::from_millis(1));

        limiter.record_failed_attempt("ana@atrium.io");
        assert!(!limiter.check_rate_limit("ana@atrium.io"));

        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.check_rate_limit("ana@atrium.io"));
    }
}
