use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session.
///
/// The `/legacy/*` group reproduces the predecessor's JSON file shapes for an
/// external, non-admin consumer. That consumer holds no session and calls
/// cross-origin, so the group is intentionally unauthenticated and sits under
/// the permissive CORS layer. Read-only: no row IDs, nothing mutable.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/login
        // Exchanges a Discord OAuth access token for a session JWT. Sign-in is
        // closed: unknown Discord accounts are rejected, never provisioned.
        .route("/auth/login", post(handlers::login_user))
        // GET /legacy/instructors: {course name: ["<server id>", ...]}
        .route("/legacy/instructors", get(handlers::export_instructors))
        // GET /legacy/questions: {course name: [{id, text, options, correct}, ...]}
        .route("/legacy/questions", get(handlers::export_questions))
        // GET /legacy/manuals: flat [{title, content, description}, ...]
        .route("/legacy/manuals", get(handlers::export_manuals))
}
