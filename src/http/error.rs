use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    /// Constraint violations become client errors; anything else is logged
    /// and reported as `message`.
    pub fn from_write(err: anyhow::Error, message: &'static str) -> Self {
        if let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() {
            if let Some(db_err) = sqlx_err.as_database_error() {
                let constraint = db_err.constraint().unwrap_or_default();
                match db_err.code().as_deref() {
                    Some("23505") if constraint.contains("users_username_key") => {
                        return AppError::conflict("username already taken");
                    }
                    Some("23505") => return AppError::conflict("already exists"),
                    Some("23503") => {
                        return AppError::bad_request(invalid_reference(constraint));
                    }
                    _ => {}
                }
            }
        }
        tracing::error!(error = ?err, "{}", message);
        AppError::internal(message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Foreign keys are named `{table}_{column}_fkey`.
fn invalid_reference(constraint: &str) -> &'static str {
    if constraint.contains("author_id") {
        "invalid author"
    } else if constraint.contains("post_id") {
        "invalid post"
    } else if constraint.contains("chat_id") {
        "invalid chat"
    } else {
        "invalid reference"
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
