use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use training_portal::{
    AppState,
    auth::{AuthUser, Claims},
    config::{AppConfig, Env},
    error::ApiError,
    models::{
        Course, CourseWithCounts, CreateInstructorRequest, CreateManualRequest,
        CreateQuestionRequest, DashboardStats, Instructor, InstructorExportRow, Manual, Question,
        QuestionExportRow, UpdateInstructorRequest, UpdateManualRequest, UpdateQuestionRequest,
        UpdateUserRequest, User,
    },
    repository::Repository,
};
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }
    async fn get_user_by_discord_id(
        &self,
        _discord_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        Ok(self.user_to_return.clone())
    }
    // The remaining trait methods are not exercised by the extractor; they
    // return inert placeholders so the mock compiles.
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        Ok(vec![])
    }
    async fn create_user(&self, _discord_id: String, _role: String) -> Result<User, sqlx::Error> {
        Ok(User::default())
    }
    async fn update_user(&self, _id: Uuid, _req: UpdateUserRequest) -> Result<User, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn delete_user(&self, _id: Uuid) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn list_courses(&self) -> Result<Vec<CourseWithCounts>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_course_by_name(&self, _name: &str) -> Result<Option<Course>, sqlx::Error> {
        Ok(None)
    }
    async fn get_course_by_name_excluding(
        &self,
        _name: &str,
        _id: Uuid,
    ) -> Result<Option<Course>, sqlx::Error> {
        Ok(None)
    }
    async fn create_course(&self, _name: String) -> Result<Course, sqlx::Error> {
        Ok(Course::default())
    }
    async fn update_course(
        &self,
        _id: Uuid,
        _name: String,
    ) -> Result<CourseWithCounts, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn delete_course(&self, _id: Uuid) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn list_questions(&self) -> Result<Vec<Question>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_question(&self, _id: Uuid) -> Result<Option<Question>, sqlx::Error> {
        Ok(None)
    }
    async fn create_question(
        &self,
        _req: CreateQuestionRequest,
    ) -> Result<Question, sqlx::Error> {
        Ok(Question::default())
    }
    async fn update_question(
        &self,
        _id: Uuid,
        _req: UpdateQuestionRequest,
    ) -> Result<Question, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn delete_question(&self, _id: Uuid) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn list_instructors(&self) -> Result<Vec<Instructor>, sqlx::Error> {
        Ok(vec![])
    }
    async fn create_instructor(
        &self,
        _req: CreateInstructorRequest,
    ) -> Result<Instructor, sqlx::Error> {
        Ok(Instructor::default())
    }
    async fn update_instructor(
        &self,
        _id: Uuid,
        _req: UpdateInstructorRequest,
    ) -> Result<Instructor, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn delete_instructor(&self, _id: Uuid) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn list_manuals(&self) -> Result<Vec<Manual>, sqlx::Error> {
        Ok(vec![])
    }
    async fn create_manual(&self, _req: CreateManualRequest) -> Result<Manual, sqlx::Error> {
        Ok(Manual::default())
    }
    async fn update_manual(
        &self,
        _id: Uuid,
        _req: UpdateManualRequest,
    ) -> Result<Manual, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn delete_manual(&self, _id: Uuid) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }
    async fn list_instructors_for_export(
        &self,
    ) -> Result<Vec<InstructorExportRow>, sqlx::Error> {
        Ok(vec![])
    }
    async fn list_questions_for_export(&self) -> Result<Vec<QuestionExportRow>, sqlx::Error> {
        Ok(vec![])
    }
    async fn list_manuals_for_export(&self) -> Result<Vec<Manual>, sqlx::Error> {
        Ok(vec![])
    }
    async fn get_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        Ok(DashboardStats::default())
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token(user_id: Uuid, secret: &str, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env, repo: MockAuthRepo, jwt_secret: String) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = jwt_secret;

    AppState {
        repo: Arc::new(repo),
        config,
    }
}

fn roster_user(id: Uuid, role: &str) -> User {
    User {
        id,
        discord_id: "180722594587082753".to_string(),
        role: role.to_string(),
        ..User::default()
    }
}

/// Builds the mutable Parts struct the extractor operates on.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, TEST_JWT_SECRET, 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(roster_user(TEST_USER_ID, "USER")),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, "USER");
    assert_eq!(user.discord_id, "180722594587082753");
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let token = create_token(TEST_USER_ID, "some-other-secret", 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(roster_user(TEST_USER_ID, "USER")),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Expired well past the default validation leeway.
    let token = create_token(TEST_USER_ID, TEST_JWT_SECRET, -3600);

    let mock_repo = MockAuthRepo {
        user_to_return: Some(roster_user(TEST_USER_ID, "USER")),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_when_user_no_longer_on_roster() {
    // A structurally valid token whose subject has been deleted must fail.
    let token = create_token(TEST_USER_ID, TEST_JWT_SECRET, 3600);

    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo {
            user_to_return: None,
        },
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let mock_repo = MockAuthRepo {
        user_to_return: Some(roster_user(mock_user_id, "ADMIN")),
    };
    let app_state = create_app_state(Env::Local, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, mock_user_id);
    assert_eq!(user.role, "ADMIN");
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mock_user_id = Uuid::new_v4();
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo {
            user_to_return: Some(roster_user(mock_user_id, "ADMIN")),
        },
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Provide ONLY the local bypass header.
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(matches!(auth_user, Err(ApiError::Unauthorized)));
}
