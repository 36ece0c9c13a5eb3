use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    Extension, Form,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

use crate::{
    api::{
        notice::{redirect_with_notice, view_with_notice, Notice},
        session::{clear_cookie, session_cookie, SessionChanged, SESSION_COOKIE},
        AppState,
    },
    models::student::{StudentFilter, StudentForm},
    services::{
        auth_service::{AdminSession, AuthServiceError},
        student_service::{StudentEditView, StudentListing, StudentServiceError},
    },
};

const LISTING: &str = "/";
const LOGIN_REQUIRED: &str = "You must log in as admin to access this page.";
const STUDENT_NOT_FOUND: &str = "Student not found.";

#[derive(Serialize)]
struct ListingResponse {
    #[serde(flatten)]
    listing: StudentListing,
    notice: Option<Notice>,
}

#[derive(Serialize)]
struct EditResponse {
    #[serde(flatten)]
    view: StudentEditView,
    notice: Option<Notice>,
}

#[derive(Serialize)]
struct LoginResponse {
    is_admin: bool,
    next: Option<String>,
    notice: Option<Notice>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// ============================================================================
// Views
// ============================================================================

/// GET / - filtered, class-grouped listing
pub async fn listing(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Query(filter): Query<StudentFilter>,
    headers: HeaderMap,
) -> Response {
    match state.students.listing(filter, &session).await {
        Ok(listing) => view_with_notice(&headers, |notice| ListingResponse { listing, notice }),
        Err(e) => {
            error!("Error loading students: {}", e);
            internal_error()
        }
    }
}

/// GET /students/:id - edit form data
pub async fn edit_page(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match state.students.edit_view(&session, &id).await {
        Ok(view) => view_with_notice(&headers, |notice| EditResponse { view, notice }),
        Err(StudentServiceError::Unauthorized) => login_required(&edit_path(&id)),
        Err(StudentServiceError::StudentNotFound) => {
            redirect_with_notice(LISTING, Notice::danger(STUDENT_NOT_FOUND))
        }
        Err(StudentServiceError::ValidationError { message }) => {
            redirect_with_notice(LISTING, Notice::warning(message))
        }
        Err(e) => {
            error!("Error loading student {}: {}", id, e);
            redirect_with_notice(LISTING, Notice::danger("Something went wrong."))
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// GET /login
pub async fn login_page(
    Extension(session): Extension<AdminSession>,
    Query(query): Query<LoginQuery>,
    headers: HeaderMap,
) -> Response {
    if session.is_admin() {
        return Redirect::to(LISTING).into_response();
    }

    view_with_notice(&headers, |notice| LoginResponse {
        is_admin: false,
        next: query.next,
        notice,
    })
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    if session.is_admin() {
        return Redirect::to(LISTING).into_response();
    }

    match state.auth.login(&form.username, &form.password) {
        Ok(token) => {
            let target = safe_next(query.next.as_deref());
            let mut response = redirect_with_notice(target, Notice::success("Login successful!"));
            let max_age = state.auth.session_timeout().num_seconds();
            if let Some(cookie) = session_cookie(&token, max_age) {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response.extensions_mut().insert(SessionChanged);
            response
        }
        Err(AuthServiceError::AuthenticationFailed) => redirect_with_notice(
            &login_path(query.next.as_deref()),
            Notice::danger("Invalid username or password!"),
        ),
        Err(e) => {
            error!("Error during login: {}", e);
            redirect_with_notice(
                &login_path(query.next.as_deref()),
                Notice::danger("Something went wrong."),
            )
        }
    }
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Response {
    state.auth.logout(&session);

    let mut response = redirect_with_notice(LISTING, Notice::info("You have been logged out."));
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_cookie(SESSION_COOKIE));
    response.extensions_mut().insert(SessionChanged);
    response
}

// ============================================================================
// Mutations (admin only)
// ============================================================================

/// POST /students
pub async fn add_student(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let form = StudentForm::from_fields(fields);

    match state.students.add_student(&session, form).await {
        Ok(_) => redirect_with_notice(LISTING, Notice::success("Student added!")),
        Err(StudentServiceError::Unauthorized) => login_required(LISTING),
        Err(StudentServiceError::ValidationError { message }) => {
            redirect_with_notice(LISTING, Notice::warning(message))
        }
        Err(e) => {
            error!("Error adding student: {}", e);
            redirect_with_notice(LISTING, Notice::danger("Failed to add student."))
        }
    }
}

/// POST /students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let form = StudentForm::from_fields(fields);

    match state.students.update_student(&session, &id, form).await {
        Ok(_) => redirect_with_notice(LISTING, Notice::success("Student updated!")),
        Err(StudentServiceError::Unauthorized) => login_required(&edit_path(&id)),
        Err(StudentServiceError::ValidationError { message }) => {
            redirect_with_notice(&edit_path(&id), Notice::warning(message))
        }
        Err(StudentServiceError::StudentNotFound) => {
            redirect_with_notice(LISTING, Notice::danger(STUDENT_NOT_FOUND))
        }
        Err(e) => {
            error!("Error updating student {}: {}", id, e);
            redirect_with_notice(&edit_path(&id), Notice::danger("Failed to update student."))
        }
    }
}

/// POST /students/:id/delete
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(id): Path<String>,
) -> Response {
    match state.students.delete_student(&session, &id).await {
        Ok(()) => redirect_with_notice(LISTING, Notice::success("Student deleted!")),
        Err(StudentServiceError::Unauthorized) => login_required(LISTING),
        Err(StudentServiceError::StudentNotFound) => {
            redirect_with_notice(LISTING, Notice::warning(STUDENT_NOT_FOUND))
        }
        Err(StudentServiceError::ValidationError { message }) => {
            redirect_with_notice(LISTING, Notice::warning(message))
        }
        Err(e) => {
            error!("Error deleting student {}: {}", id, e);
            redirect_with_notice(LISTING, Notice::danger("Failed to delete student."))
        }
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    match state.data_file.health_check().await {
        Ok(true) => Json(HealthResponse { status: "ok" }).into_response(),
        Ok(false) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "degraded" }),
        )
            .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "unavailable" }),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Something went wrong.",
        }),
    )
        .into_response()
}

fn edit_path(id: &str) -> String {
    format!("/students/{}", urlencoding::encode(id))
}

fn login_path(next: Option<&str>) -> String {
    match next {
        Some(next) => format!("/login?next={}", urlencoding::encode(next)),
        None => "/login".to_string(),
    }
}

fn login_required(next: &str) -> Response {
    redirect_with_notice(&login_path(Some(next)), Notice::danger(LOGIN_REQUIRED))
}

/// Only local absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => LISTING,
    }
}
