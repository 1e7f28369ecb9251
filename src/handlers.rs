use crate::{
    AppState,
    auth::{AuthUser, mint_token},
    error::ApiError,
    export,
    models::{
        Course, CourseWithCounts, CreateCourseRequest, CreateInstructorRequest,
        CreateManualRequest, CreateQuestionRequest, CreateUserRequest, DashboardStats, Instructor,
        LegacyManual, LoginRequest, LoginResponse, Manual, Question, ROLE_ADMIN, ROLE_USER,
        UpdateCourseRequest, UpdateInstructorRequest, UpdateManualRequest, UpdateQuestionRequest,
        UpdateUserRequest, User,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

// --- Validation Helpers ---

/// Enforces the question invariants: at least 2 alternatives, none blank, and
/// the correct-answer index within range. Shared by create and update.
pub fn validate_alternatives(alternatives: &[String], correct_answer: i32) -> Result<(), ApiError> {
    if alternatives.len() < 2 {
        return Err(ApiError::validation("At least 2 alternatives are required"));
    }
    if alternatives.iter().any(|alt| alt.trim().is_empty()) {
        return Err(ApiError::validation("All alternatives must be filled in"));
    }
    if correct_answer < 0 || correct_answer as usize >= alternatives.len() {
        return Err(ApiError::validation("Correct answer index is out of range"));
    }
    Ok(())
}

/// Only the two roster roles are storable.
pub fn validate_role(role: &str) -> Result<(), ApiError> {
    if role != ROLE_ADMIN && role != ROLE_USER {
        return Err(ApiError::validation("Role must be ADMIN or USER"));
    }
    Ok(())
}

fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    // Under-privileged callers fail exactly like unauthenticated ones.
    if auth.role != ROLE_ADMIN {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

// --- Auth & Profile ---

/// DiscordUser
///
/// Minimal struct to deserialize the identity provider's /users/@me response,
/// capturing only the stable account ID.
#[derive(Deserialize)]
struct DiscordUser {
    id: String,
}

/// login_user
///
/// [Public Route] Exchanges a Discord OAuth access token for a session JWT.
///
/// *Flow*: calls the provider's /users/@me endpoint to resolve the caller's
/// stable Discord ID, then looks that ID up in the roster. Sign-in is closed:
/// a Discord account with no user row is rejected with 401, never
/// auto-provisioned.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Unknown account or bad token")
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let api_base =
        std::env::var("DISCORD_API_URL").unwrap_or_else(|_| "https://discord.com/api".to_string());

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/users/@me", api_base))
        .bearer_auth(&payload.access_token)
        .send()
        .await
        .map_err(|e| ApiError::Internal(format!("identity provider unreachable: {e}")))?;

    if !response.status().is_success() {
        // The provider rejected the access token.
        return Err(ApiError::Unauthorized);
    }

    let discord_user = response
        .json::<DiscordUser>()
        .await
        .map_err(|e| ApiError::Internal(format!("identity provider response: {e}")))?;

    let user = state
        .repo
        .get_user_by_discord_id(&discord_user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let token = mint_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("token signing: {e}")))?;

    Ok(Json(LoginResponse { token, user }))
}

/// get_me
///
/// [Authenticated Route] The caller's own user row.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = User))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(user))
}

// --- Courses ---

/// get_courses
///
/// [Authenticated Route] All courses, name-ascending, each annotated with its
/// question and instructor counts.
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "Courses", body = [CourseWithCounts]))
)]
pub async fn get_courses(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseWithCounts>>, ApiError> {
    Ok(Json(state.repo.list_courses().await?))
}

/// create_course
///
/// [Authenticated Route] Creates a course. The name must be non-empty and not
/// already taken; the duplicate pre-check gives a friendly 400 while the
/// storage-layer unique constraint remains the backstop.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 400, description = "Missing or duplicate name")
    )
)]
pub async fn create_course(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Course name is required"));
    }

    if state.repo.get_course_by_name(name).await?.is_some() {
        return Err(ApiError::validation("Course already exists"));
    }

    let course = state.repo.create_course(name.to_string()).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// update_course
///
/// [Authenticated Route] Renames a course. The duplicate check excludes the
/// row being renamed.
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses((status = 200, description = "Updated", body = CourseWithCounts))
)]
pub async fn update_course(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<CourseWithCounts>, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Course name is required"));
    }

    if state
        .repo
        .get_course_by_name_excluding(name, id)
        .await?
        .is_some()
    {
        return Err(ApiError::validation("Course name already exists"));
    }

    let course = state.repo.update_course(id, name.to_string()).await?;
    Ok(Json(course))
}

/// delete_course
///
/// [Authenticated Route] Deletes a course. Its questions and instructors go
/// with it (cascade at the storage layer).
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses((status = 200, description = "Deleted"))
)]
pub async fn delete_course(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.repo.delete_course(id).await?;
    Ok(success())
}

// --- Questions ---

/// get_questions
///
/// [Authenticated Route] All questions, newest-first, with the owning course
/// name joined in.
#[utoipa::path(
    get,
    path = "/questions",
    responses((status = 200, description = "Questions", body = [Question]))
)]
pub async fn get_questions(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(state.repo.list_questions().await?))
}

/// create_question
///
/// [Authenticated Route] Creates a multiple-choice question after enforcing
/// the alternative-count, blank-alternative, and index-range invariants.
#[utoipa::path(
    post,
    path = "/questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Created", body = Question),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_question(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    if payload.question.trim().is_empty() {
        return Err(ApiError::validation("Question text is required"));
    }
    validate_alternatives(&payload.alternatives, payload.correct_answer)?;

    let question = state.repo.create_question(payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// update_question
///
/// [Authenticated Route] Partial update. Provided fields pass the same checks
/// as on create; when only one side of the alternatives/correct-answer pair
/// changes, the other side is read from the stored row so the index-range
/// invariant holds after every update.
#[utoipa::path(
    put,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    request_body = UpdateQuestionRequest,
    responses((status = 200, description = "Updated", body = Question))
)]
pub async fn update_question(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    if let Some(text) = &payload.question {
        if text.trim().is_empty() {
            return Err(ApiError::validation("Question text is required"));
        }
    }

    match (&payload.alternatives, payload.correct_answer) {
        (Some(alternatives), Some(correct)) => validate_alternatives(alternatives, correct)?,
        (Some(alternatives), None) => {
            let current = state
                .repo
                .get_question(id)
                .await?
                .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;
            validate_alternatives(alternatives, current.correct_answer)?;
        }
        (None, Some(correct)) => {
            let current = state
                .repo
                .get_question(id)
                .await?
                .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;
            validate_alternatives(&current.alternatives, correct)?;
        }
        (None, None) => {}
    }

    let question = state.repo.update_question(id, payload).await?;
    Ok(Json(question))
}

/// delete_question
#[utoipa::path(
    delete,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question ID")),
    responses((status = 200, description = "Deleted"))
)]
pub async fn delete_question(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.repo.delete_question(id).await?;
    Ok(success())
}

// --- Instructors ---

/// get_instructors
///
/// [Authenticated Route] All instructors, newest-first, with course name.
#[utoipa::path(
    get,
    path = "/instructors",
    responses((status = 200, description = "Instructors", body = [Instructor]))
)]
pub async fn get_instructors(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Instructor>>, ApiError> {
    Ok(Json(state.repo.list_instructors().await?))
}

/// create_instructor
///
/// [Authenticated Route] Attaches a role-play-server identity to a course.
#[utoipa::path(
    post,
    path = "/instructors",
    request_body = CreateInstructorRequest,
    responses(
        (status = 201, description = "Created", body = Instructor),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_instructor(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateInstructorRequest>,
) -> Result<(StatusCode, Json<Instructor>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Instructor name is required"));
    }

    let instructor = state.repo.create_instructor(payload).await?;
    Ok((StatusCode::CREATED, Json(instructor)))
}

/// update_instructor
///
/// [Authenticated Route] Partial update.
#[utoipa::path(
    put,
    path = "/instructors/{id}",
    params(("id" = Uuid, Path, description = "Instructor ID")),
    request_body = UpdateInstructorRequest,
    responses((status = 200, description = "Updated", body = Instructor))
)]
pub async fn update_instructor(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInstructorRequest>,
) -> Result<Json<Instructor>, ApiError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Instructor name is required"));
        }
    }

    let instructor = state.repo.update_instructor(id, payload).await?;
    Ok(Json(instructor))
}

/// delete_instructor
#[utoipa::path(
    delete,
    path = "/instructors/{id}",
    params(("id" = Uuid, Path, description = "Instructor ID")),
    responses((status = 200, description = "Deleted"))
)]
pub async fn delete_instructor(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.repo.delete_instructor(id).await?;
    Ok(success())
}

// --- Manuals ---

/// get_manuals
///
/// [Authenticated Route] All manuals, newest-first. Manuals are global, never
/// course-scoped.
#[utoipa::path(
    get,
    path = "/manuals",
    responses((status = 200, description = "Manuals", body = [Manual]))
)]
pub async fn get_manuals(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Manual>>, ApiError> {
    Ok(Json(state.repo.list_manuals().await?))
}

/// create_manual
///
/// [Authenticated Route] Title and URL required; a missing description is
/// stored as the empty string.
#[utoipa::path(
    post,
    path = "/manuals",
    request_body = CreateManualRequest,
    responses(
        (status = 201, description = "Created", body = Manual),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_manual(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateManualRequest>,
) -> Result<(StatusCode, Json<Manual>), ApiError> {
    if payload.title.trim().is_empty() || payload.url.trim().is_empty() {
        return Err(ApiError::validation("Title and URL are required"));
    }

    let manual = state.repo.create_manual(payload).await?;
    Ok((StatusCode::CREATED, Json(manual)))
}

/// update_manual
///
/// [Authenticated Route] Partial update.
#[utoipa::path(
    put,
    path = "/manuals/{id}",
    params(("id" = Uuid, Path, description = "Manual ID")),
    request_body = UpdateManualRequest,
    responses((status = 200, description = "Updated", body = Manual))
)]
pub async fn update_manual(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateManualRequest>,
) -> Result<Json<Manual>, ApiError> {
    let manual = state.repo.update_manual(id, payload).await?;
    Ok(Json(manual))
}

/// delete_manual
#[utoipa::path(
    delete,
    path = "/manuals/{id}",
    params(("id" = Uuid, Path, description = "Manual ID")),
    responses((status = 200, description = "Deleted"))
)]
pub async fn delete_manual(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.repo.delete_manual(id).await?;
    Ok(success())
}

// --- User Management (Admin) ---

/// get_users
///
/// [Admin Route] The full roster, newest-first.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Not an admin")
    )
)]
pub async fn get_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_admin(&auth)?;
    Ok(Json(state.repo.list_users().await?))
}

/// create_user
///
/// [Admin Route] Provisions a roster entry for a Discord account. The role
/// defaults to 'USER'.
#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Missing or duplicate Discord ID")
    )
)]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    require_admin(&auth)?;

    let discord_id = payload.discord_id.trim();
    if discord_id.is_empty() {
        return Err(ApiError::validation("Discord ID is required"));
    }

    let role = payload.role.unwrap_or_else(|| ROLE_USER.to_string());
    validate_role(&role)?;

    if state
        .repo
        .get_user_by_discord_id(discord_id)
        .await?
        .is_some()
    {
        return Err(ApiError::validation("User already exists"));
    }

    let user = state.repo.create_user(discord_id.to_string(), role).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// update_user
///
/// [Admin Route] Partial update of a roster entry (Discord ID and/or role).
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    require_admin(&auth)?;

    if let Some(role) = &payload.role {
        validate_role(role)?;
    }
    if let Some(discord_id) = &payload.discord_id {
        if discord_id.trim().is_empty() {
            return Err(ApiError::validation("Discord ID is required"));
        }
    }

    let user = state.repo.update_user(id, payload).await?;
    Ok(Json(user))
}

/// delete_user
///
/// [Admin Route] Removes a roster entry. A caller can never delete their own
/// row; the attempt is a validation failure and the row remains.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Self-deletion attempt")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&auth)?;

    if id == auth.id {
        return Err(ApiError::validation("Cannot delete yourself"));
    }

    state.repo.delete_user(id).await?;
    Ok(success())
}

/// get_admin_stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = DashboardStats))
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    require_admin(&auth)?;
    Ok(Json(state.repo.get_stats().await?))
}

// --- Legacy Exports ---

/// export_instructors
///
/// [Public Route] Instructors in the predecessor's JSON file shape:
/// `{course name: ["<server id>", ...]}`. Unauthenticated and CORS-enabled by
/// design for the external (non-admin) consumer.
#[utoipa::path(
    get,
    path = "/legacy/instructors",
    responses((status = 200, description = "Instructors grouped by course name"))
)]
pub async fn export_instructors(
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let rows = state.repo.list_instructors_for_export().await?;
    Ok(Json(export::group_instructors(&rows)))
}

/// export_questions
///
/// [Public Route] Questions in the predecessor's JSON file shape:
/// `{course name: [{id, text, options, correct}, ...]}`.
#[utoipa::path(
    get,
    path = "/legacy/questions",
    responses((status = 200, description = "Questions grouped by course name"))
)]
pub async fn export_questions(
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let rows = state.repo.list_questions_for_export().await?;
    Ok(Json(export::group_questions(&rows)))
}

/// export_manuals
///
/// [Public Route] Manuals in the predecessor's flat JSON file shape.
#[utoipa::path(
    get,
    path = "/legacy/manuals",
    responses((status = 200, description = "Manuals, flat list", body = [LegacyManual]))
)]
pub async fn export_manuals(
    State(state): State<AppState>,
) -> Result<Json<Vec<LegacyManual>>, ApiError> {
    let rows = state.repo.list_manuals_for_export().await?;
    Ok(Json(export::manuals_to_legacy(&rows)))
}
