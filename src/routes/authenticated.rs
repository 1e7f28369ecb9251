use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// The resource CRUD surface, available to any user who passed the
/// authentication layer: both 'USER' and 'ADMIN' roles manage course
/// content. Every handler here receives a validated `AuthUser`; the
/// middleware on the layer above rejects everything else with 401.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The caller's own roster row (ID, Discord ID, role).
        .route("/me", get(handlers::get_me))
        // --- Courses ---
        // Listing is name-ascending and annotated with question/instructor
        // counts; deletion cascades to both at the storage layer.
        .route(
            "/courses",
            get(handlers::get_courses).post(handlers::create_course),
        )
        .route(
            "/courses/{id}",
            put(handlers::update_course).delete(handlers::delete_course),
        )
        // --- Questions ---
        .route(
            "/questions",
            get(handlers::get_questions).post(handlers::create_question),
        )
        .route(
            "/questions/{id}",
            put(handlers::update_question).delete(handlers::delete_question),
        )
        // --- Instructors ---
        .route(
            "/instructors",
            get(handlers::get_instructors).post(handlers::create_instructor),
        )
        .route(
            "/instructors/{id}",
            put(handlers::update_instructor).delete(handlers::delete_instructor),
        )
        // --- Manuals ---
        .route(
            "/manuals",
            get(handlers::get_manuals).post(handlers::create_manual),
        )
        .route(
            "/manuals/{id}",
            put(handlers::update_manual).delete(handlers::delete_manual),
        )
}
