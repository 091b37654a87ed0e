// ============================
// atrium-backend-lib/src/api_router.rs
// ============================
//! HTTP router for the auth API.
use crate::handlers::auth;
use crate::storage::Storage;
use crate::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the auth API router
pub fn create_router<S: Storage + Clone + Send + Sync + 'static>(
    state: Arc<AppState<S>>,
) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/set-password", post(auth::set_password::<S>))
        .route("/auth/complete-profile", post(auth::complete_profile::<S>))
        .route("/auth/validate", post(auth::validate))
        .route("/auth/refresh", post(auth::refresh::<S>))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout::<S>))
        .route("/auth/reset-password", post(auth::reset_password::<S>))
        .route("/auth/preferences", put(auth::update_preferences::<S>))
        .route("/auth/agent-config", put(auth::update_agent_config::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
