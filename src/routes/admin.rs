use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Routes exclusively for users with the 'ADMIN' role: roster management and
/// the dashboard counters. The router is nested under `/admin` behind the
/// authentication middleware; each handler then checks the resolved role and
/// answers 401 when it is not 'ADMIN' (under-privileged and unauthenticated
/// callers fail identically).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters (courses, questions, instructors, manuals, users).
        .route("/stats", get(handlers::get_admin_stats))
        // GET/POST /admin/users
        // Roster listing and provisioning. New entries default to 'USER'.
        .route(
            "/users",
            get(handlers::get_users).post(handlers::create_user),
        )
        // PUT/DELETE /admin/users/{id}
        // Partial roster edits; deletion refuses the caller's own row.
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
}
