use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles ---

/// Role string stored on the `users` row. Only these two values are valid.
pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A member of the closed roster allowed to sign in, identified by the stable
/// Discord account ID the identity provider reports. `role` is the RBAC field:
/// 'ADMIN' or 'USER'.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub discord_id: String,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Course
///
/// A named training track. Questions and instructors belong to exactly one
/// course and are removed with it (cascade at the storage layer).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// CourseWithCounts
///
/// Listing shape for courses: the row plus the number of related questions
/// and instructors, computed by the repository query.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CourseWithCounts {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    pub question_count: i64,
    pub instructor_count: i64,
}

/// Question
///
/// A multiple-choice question. Invariants enforced at the handler layer:
/// at least 2 alternatives, none blank, and `correct_answer` indexing into
/// `alternatives`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Question {
    pub id: Uuid,
    pub course_id: Uuid,
    pub question: String,
    pub alternatives: Vec<String>,
    pub correct_answer: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // Loaded via a JOIN with `courses` in the repository query.
    #[sqlx(default)]
    pub course_name: Option<String>,
}

/// Instructor
///
/// A role-play-server identity attached to a course. `server_id` is the
/// external server's own numeric ID for the person, not ours.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Instructor {
    pub id: Uuid,
    pub course_id: Uuid,
    pub server_id: i64,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub course_name: Option<String>,
}

/// Manual
///
/// A global reference document. Not course-scoped: the course-grouped shape in
/// some predecessor export files is a format artifact, not a relationship.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Manual {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateCourseRequest
///
/// Input payload for POST /courses. The name must be non-empty and unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub name: String,
}

/// UpdateCourseRequest
///
/// Input payload for PUT /courses/{id}. A course only carries its name, so the
/// update is not partial: the name is required, and uniqueness is re-checked
/// against every other course.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCourseRequest {
    pub name: String,
}

/// CreateQuestionRequest
///
/// Input payload for POST /questions.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateQuestionRequest {
    pub course_id: Uuid,
    pub question: String,
    pub alternatives: Vec<String>,
    pub correct_answer: i32,
}

/// UpdateQuestionRequest
///
/// Partial update payload for PUT /questions/{id}. Only provided fields are
/// changed; provided fields pass the same validation as on create.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateQuestionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<i32>,
}

/// CreateInstructorRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateInstructorRequest {
    pub course_id: Uuid,
    pub server_id: i64,
    pub name: String,
}

/// UpdateInstructorRequest
///
/// Partial update payload for PUT /instructors/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateInstructorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// CreateManualRequest
///
/// Title and URL are required; a missing description is stored as "".
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateManualRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// UpdateManualRequest
///
/// Partial update payload for PUT /manuals/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateManualRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreateUserRequest
///
/// Input payload for POST /admin/users. `role` defaults to 'USER'.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub discord_id: String,
    pub role: Option<String>,
}

/// UpdateUserRequest
///
/// Partial update payload for PUT /admin/users/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// LoginRequest
///
/// Input payload for POST /auth/login: the OAuth access token obtained by the
/// frontend from the Discord authorization flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub access_token: String,
}

/// LoginResponse
///
/// The signed session JWT plus the resolved user row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// --- Dashboard Schema (Output) ---

/// DashboardStats
///
/// Output schema for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardStats {
    pub total_courses: i64,
    pub total_questions: i64,
    pub total_instructors: i64,
    pub total_manuals: i64,
    pub total_users: i64,
}

// --- Legacy Export Schemas ---

/// InstructorExportRow
///
/// Lean row fetched for the legacy instructor export: course name joined in,
/// ordered oldest-first so grouping preserves insertion order.
#[derive(Debug, Clone, FromRow)]
pub struct InstructorExportRow {
    pub course_name: String,
    pub server_id: i64,
}

/// QuestionExportRow
///
/// Lean row fetched for the legacy question export.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionExportRow {
    pub course_name: String,
    pub question: String,
    pub alternatives: Vec<String>,
    pub correct_answer: i32,
}

/// LegacyQuestion
///
/// One entry of the pre-database question file shape. The `id` is assigned at
/// transform time, sequentially from 1 across the whole export.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyQuestion {
    pub id: i32,
    pub text: String,
    pub options: Vec<String>,
    pub correct: i32,
}

/// LegacyManual
///
/// One entry of the pre-database manual file shape. The legacy key for the
/// URL is `content`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyManual {
    pub title: String,
    pub content: String,
    pub description: String,
}
