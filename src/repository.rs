use crate::models::{
    Course, CourseWithCounts, CreateInstructorRequest, CreateManualRequest, CreateQuestionRequest,
    DashboardStats, Instructor, InstructorExportRow, Manual, Question, QuestionExportRow,
    UpdateInstructorRequest, UpdateManualRequest, UpdateQuestionRequest, UpdateUserRequest, User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers interact
/// with the data layer through this trait only, so the concrete store
/// (Postgres, mock) can be swapped in tests.
///
/// Every fallible operation returns `Result<_, sqlx::Error>`; updates and
/// deletes that match no row yield `sqlx::Error::RowNotFound`, which the
/// handler layer surfaces as the generic storage failure.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_discord_id(&self, discord_id: &str) -> Result<Option<User>, sqlx::Error>;
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error>;
    async fn create_user(&self, discord_id: String, role: String) -> Result<User, sqlx::Error>;
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Result<User, sqlx::Error>;
    async fn delete_user(&self, id: Uuid) -> Result<(), sqlx::Error>;

    // --- Courses ---
    // Listing is name-ascending and annotated with related-row counts.
    async fn list_courses(&self) -> Result<Vec<CourseWithCounts>, sqlx::Error>;
    async fn get_course_by_name(&self, name: &str) -> Result<Option<Course>, sqlx::Error>;
    // Duplicate check for renames: matches any OTHER course with the name.
    async fn get_course_by_name_excluding(
        &self,
        name: &str,
        id: Uuid,
    ) -> Result<Option<Course>, sqlx::Error>;
    async fn create_course(&self, name: String) -> Result<Course, sqlx::Error>;
    async fn update_course(&self, id: Uuid, name: String) -> Result<CourseWithCounts, sqlx::Error>;
    // Cascades to questions and instructors via the schema's FK rules.
    async fn delete_course(&self, id: Uuid) -> Result<(), sqlx::Error>;

    // --- Questions ---
    async fn list_questions(&self) -> Result<Vec<Question>, sqlx::Error>;
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, sqlx::Error>;
    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question, sqlx::Error>;
    async fn update_question(
        &self,
        id: Uuid,
        req: UpdateQuestionRequest,
    ) -> Result<Question, sqlx::Error>;
    async fn delete_question(&self, id: Uuid) -> Result<(), sqlx::Error>;

    // --- Instructors ---
    async fn list_instructors(&self) -> Result<Vec<Instructor>, sqlx::Error>;
    async fn create_instructor(
        &self,
        req: CreateInstructorRequest,
    ) -> Result<Instructor, sqlx::Error>;
    async fn update_instructor(
        &self,
        id: Uuid,
        req: UpdateInstructorRequest,
    ) -> Result<Instructor, sqlx::Error>;
    async fn delete_instructor(&self, id: Uuid) -> Result<(), sqlx::Error>;

    // --- Manuals ---
    async fn list_manuals(&self) -> Result<Vec<Manual>, sqlx::Error>;
    async fn create_manual(&self, req: CreateManualRequest) -> Result<Manual, sqlx::Error>;
    async fn update_manual(
        &self,
        id: Uuid,
        req: UpdateManualRequest,
    ) -> Result<Manual, sqlx::Error>;
    async fn delete_manual(&self, id: Uuid) -> Result<(), sqlx::Error>;

    // --- Legacy export reads ---
    // Oldest-first so the export transform preserves insertion order.
    async fn list_instructors_for_export(&self) -> Result<Vec<InstructorExportRow>, sqlx::Error>;
    async fn list_questions_for_export(&self) -> Result<Vec<QuestionExportRow>, sqlx::Error>;
    async fn list_manuals_for_export(&self) -> Result<Vec<Manual>, sqlx::Error>;

    // --- Dashboard ---
    async fn get_stats(&self) -> Result<DashboardStats, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL connection pool built once at startup.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps an `execute` result to `RowNotFound` when nothing matched, so a delete
/// of an unknown id surfaces through the same storage-error path the
/// predecessor used.
fn require_affected(result: sqlx::postgres::PgQueryResult) -> Result<(), sqlx::Error> {
    if result.rows_affected() > 0 {
        Ok(())
    } else {
        Err(sqlx::Error::RowNotFound)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, discord_id, role, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Lookup by the identity provider's stable external ID. This is the
    /// session-to-role resolution path used at login.
    async fn get_user_by_discord_id(&self, discord_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, discord_id, role, created_at, updated_at FROM users WHERE discord_id = $1",
        )
        .bind(discord_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, discord_id, role, created_at, updated_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_user(&self, discord_id: String, role: String) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, discord_id, role, created_at, updated_at)
               VALUES ($1, $2, $3, NOW(), NOW())
               RETURNING id, discord_id, role, created_at, updated_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(discord_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    /// Partial update via COALESCE: a column only changes when the
    /// corresponding field is `Some`.
    async fn update_user(&self, id: Uuid, req: UpdateUserRequest) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET discord_id = COALESCE($2, discord_id),
                   role = COALESCE($3, role),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, discord_id, role, created_at, updated_at"#,
        )
        .bind(id)
        .bind(req.discord_id)
        .bind(req.role)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_affected(result)
    }

    // --- COURSES ---

    /// Name-ascending listing, each row annotated with the counts of its
    /// related questions and instructors.
    async fn list_courses(&self) -> Result<Vec<CourseWithCounts>, sqlx::Error> {
        sqlx::query_as::<_, CourseWithCounts>(
            r#"
            SELECT
                c.id, c.name, c.created_at, c.updated_at,
                (SELECT COUNT(*) FROM questions q WHERE q.course_id = c.id) AS question_count,
                (SELECT COUNT(*) FROM instructors i WHERE i.course_id = c.id) AS instructor_count
            FROM courses c
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_course_by_name(&self, name: &str) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "SELECT id, name, created_at, updated_at FROM courses WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_course_by_name_excluding(
        &self,
        name: &str,
        id: Uuid,
    ) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            "SELECT id, name, created_at, updated_at FROM courses WHERE name = $1 AND id <> $2",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_course(&self, name: String) -> Result<Course, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"INSERT INTO courses (id, name, created_at, updated_at)
               VALUES ($1, $2, NOW(), NOW())
               RETURNING id, name, created_at, updated_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    /// Rename, returning the row in the annotated listing shape.
    async fn update_course(&self, id: Uuid, name: String) -> Result<CourseWithCounts, sqlx::Error> {
        sqlx::query_as::<_, CourseWithCounts>(
            r#"
            WITH updated AS (
                UPDATE courses SET name = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, name, created_at, updated_at
            )
            SELECT
                u.id, u.name, u.created_at, u.updated_at,
                (SELECT COUNT(*) FROM questions q WHERE q.course_id = u.id) AS question_count,
                (SELECT COUNT(*) FROM instructors i WHERE i.course_id = u.id) AS instructor_count
            FROM updated u
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    /// Cascade of questions and instructors is handled by the FK rules in the
    /// schema, not orchestrated here.
    async fn delete_course(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_affected(result)
    }

    // --- QUESTIONS ---

    async fn list_questions(&self) -> Result<Vec<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.course_id, q.question, q.alternatives, q.correct_answer,
                   q.created_at, q.updated_at, c.name AS course_name
            FROM questions q
            JOIN courses c ON q.course_id = c.id
            ORDER BY q.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            SELECT q.id, q.course_id, q.question, q.alternatives, q.correct_answer,
                   q.created_at, q.updated_at, c.name AS course_name
            FROM questions q
            JOIN courses c ON q.course_id = c.id
            WHERE q.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert-then-join in one statement (CTE) so the response carries the
    /// owning course name.
    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            WITH inserted AS (
                INSERT INTO questions (id, course_id, question, alternatives, correct_answer, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                RETURNING id, course_id, question, alternatives, correct_answer, created_at, updated_at
            )
            SELECT i.id, i.course_id, i.question, i.alternatives, i.correct_answer,
                   i.created_at, i.updated_at, c.name AS course_name
            FROM inserted i
            JOIN courses c ON i.course_id = c.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.course_id)
        .bind(req.question)
        .bind(req.alternatives)
        .bind(req.correct_answer)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_question(
        &self,
        id: Uuid,
        req: UpdateQuestionRequest,
    ) -> Result<Question, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            r#"
            WITH updated AS (
                UPDATE questions
                SET course_id = COALESCE($2, course_id),
                    question = COALESCE($3, question),
                    alternatives = COALESCE($4, alternatives),
                    correct_answer = COALESCE($5, correct_answer),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id, course_id, question, alternatives, correct_answer, created_at, updated_at
            )
            SELECT u.id, u.course_id, u.question, u.alternatives, u.correct_answer,
                   u.created_at, u.updated_at, c.name AS course_name
            FROM updated u
            JOIN courses c ON u.course_id = c.id
            "#,
        )
        .bind(id)
        .bind(req.course_id)
        .bind(req.question)
        .bind(req.alternatives)
        .bind(req.correct_answer)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_question(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_affected(result)
    }

    // --- INSTRUCTORS ---

    async fn list_instructors(&self) -> Result<Vec<Instructor>, sqlx::Error> {
        sqlx::query_as::<_, Instructor>(
            r#"
            SELECT i.id, i.course_id, i.server_id, i.name,
                   i.created_at, i.updated_at, c.name AS course_name
            FROM instructors i
            JOIN courses c ON i.course_id = c.id
            ORDER BY i.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_instructor(
        &self,
        req: CreateInstructorRequest,
    ) -> Result<Instructor, sqlx::Error> {
        sqlx::query_as::<_, Instructor>(
            r#"
            WITH inserted AS (
                INSERT INTO instructors (id, course_id, server_id, name, created_at, updated_at)
                VALUES ($1, $2, $3, $4, NOW(), NOW())
                RETURNING id, course_id, server_id, name, created_at, updated_at
            )
            SELECT i.id, i.course_id, i.server_id, i.name,
                   i.created_at, i.updated_at, c.name AS course_name
            FROM inserted i
            JOIN courses c ON i.course_id = c.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.course_id)
        .bind(req.server_id)
        .bind(req.name)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_instructor(
        &self,
        id: Uuid,
        req: UpdateInstructorRequest,
    ) -> Result<Instructor, sqlx::Error> {
        sqlx::query_as::<_, Instructor>(
            r#"
            WITH updated AS (
                UPDATE instructors
                SET course_id = COALESCE($2, course_id),
                    server_id = COALESCE($3, server_id),
                    name = COALESCE($4, name),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id, course_id, server_id, name, created_at, updated_at
            )
            SELECT u.id, u.course_id, u.server_id, u.name,
                   u.created_at, u.updated_at, c.name AS course_name
            FROM updated u
            JOIN courses c ON u.course_id = c.id
            "#,
        )
        .bind(id)
        .bind(req.course_id)
        .bind(req.server_id)
        .bind(req.name)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_instructor(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM instructors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_affected(result)
    }

    // --- MANUALS ---

    async fn list_manuals(&self) -> Result<Vec<Manual>, sqlx::Error> {
        sqlx::query_as::<_, Manual>(
            r#"SELECT id, title, url, description, created_at, updated_at
               FROM manuals ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn create_manual(&self, req: CreateManualRequest) -> Result<Manual, sqlx::Error> {
        sqlx::query_as::<_, Manual>(
            r#"INSERT INTO manuals (id, title, url, description, created_at, updated_at)
               VALUES ($1, $2, $3, $4, NOW(), NOW())
               RETURNING id, title, url, description, created_at, updated_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(req.title)
        .bind(req.url)
        .bind(req.description.unwrap_or_default())
        .fetch_one(&self.pool)
        .await
    }

    async fn update_manual(
        &self,
        id: Uuid,
        req: UpdateManualRequest,
    ) -> Result<Manual, sqlx::Error> {
        sqlx::query_as::<_, Manual>(
            r#"UPDATE manuals
               SET title = COALESCE($2, title),
                   url = COALESCE($3, url),
                   description = COALESCE($4, description),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING id, title, url, description, created_at, updated_at"#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.url)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_manual(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM manuals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        require_affected(result)
    }

    // --- LEGACY EXPORT READS ---

    async fn list_instructors_for_export(&self) -> Result<Vec<InstructorExportRow>, sqlx::Error> {
        sqlx::query_as::<_, InstructorExportRow>(
            r#"
            SELECT c.name AS course_name, i.server_id
            FROM instructors i
            JOIN courses c ON i.course_id = c.id
            ORDER BY i.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_questions_for_export(&self) -> Result<Vec<QuestionExportRow>, sqlx::Error> {
        sqlx::query_as::<_, QuestionExportRow>(
            r#"
            SELECT c.name AS course_name, q.question, q.alternatives, q.correct_answer
            FROM questions q
            JOIN courses c ON q.course_id = c.id
            ORDER BY q.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn list_manuals_for_export(&self) -> Result<Vec<Manual>, sqlx::Error> {
        sqlx::query_as::<_, Manual>(
            r#"SELECT id, title, url, description, created_at, updated_at
               FROM manuals ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await
    }

    // --- DASHBOARD ---

    /// Compiles the dashboard counters in a single call.
    async fn get_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        let total_courses = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        let total_questions = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        let total_instructors = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM instructors")
            .fetch_one(&self.pool)
            .await?;
        let total_manuals = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM manuals")
            .fetch_one(&self.pool)
            .await?;
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            total_courses,
            total_questions,
            total_instructors,
            total_manuals,
            total_users,
        })
    }
}
