use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{
        category::CategoryError, reminder::ReminderError, task::TaskError, user::UserError,
    },
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Reminder(#[from] ReminderError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::User(err) => match err {
                UserError::UserNotFound => (StatusCode::NOT_FOUND, "UserError"),
                UserError::EmailTaken => (StatusCode::CONFLICT, "UserError"),
                UserError::Validation(_) => (StatusCode::BAD_REQUEST, "UserError"),
                UserError::Database(db_err) => db_status(db_err, "UserError"),
            },
            ApiError::Category(err) => match err {
                CategoryError::CategoryNotFound | CategoryError::UserNotFound => {
                    (StatusCode::NOT_FOUND, "CategoryError")
                }
                CategoryError::Validation(_) => (StatusCode::BAD_REQUEST, "CategoryError"),
                CategoryError::Database(db_err) => db_status(db_err, "CategoryError"),
            },
            ApiError::Task(err) => match err {
                TaskError::TaskNotFound
                | TaskError::UserNotFound
                | TaskError::CategoryNotFound => (StatusCode::NOT_FOUND, "TaskError"),
                TaskError::Validation(_) => (StatusCode::BAD_REQUEST, "TaskError"),
                TaskError::Database(db_err) => db_status(db_err, "TaskError"),
            },
            ApiError::Reminder(err) => match err {
                ReminderError::ReminderNotFound | ReminderError::TaskNotFound => {
                    (StatusCode::NOT_FOUND, "ReminderError")
                }
                ReminderError::Database(db_err) => db_status(db_err, "ReminderError"),
            },
            ApiError::Database(db_err) => db_status(db_err, "DatabaseError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        let error_message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

fn db_status(err: &DbErr, error_type: &'static str) -> (StatusCode, &'static str) {
    match err {
        DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, error_type),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, error_type),
    }
}
