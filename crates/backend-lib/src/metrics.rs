// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const USER_CREATED: &str = "auth.user.created";
pub const PASSWORD_SET: &str = "auth.password.set";
pub const PROFILE_COMPLETED: &str = "auth.profile.completed";
pub const SESSION_CREATED: &str = "auth.session.created";
pub const SESSION_EXPIRED: &str = "auth.session.expired";
pub const SESSION_REVOKED: &str = "auth.session.revoked";
