// ============================
// atrium-client-lib/src/lib.rs
// ============================
//! Client-side authentication gate for the Atrium platform.
//!
//! Everything downstream of this crate (chat, analytics, report views)
//! consumes only the gate's [`AuthState`] and the resolved
//! [`atrium_common::UserProfile`]; no other component talks to the
//! credential endpoints or sees the raw session token.

pub mod api;
pub mod error;
pub mod gate;
pub mod token_slot;

pub use api::{ApiError, AuthApi, HttpAuthApi};
pub use error::GateError;
pub use gate::{AuthGate, AuthState};
pub use token_slot::{FileTokenSlot, TokenSlot};
