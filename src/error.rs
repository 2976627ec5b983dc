use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One failed validation rule, tied to the request field that broke it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] so every failure leaves the service in the
/// uniform `{result, message, ...}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("insufficient rights")]
    Forbidden,

    #[error("user not found")]
    NotFound,

    #[error("email already in use")]
    EmailTaken,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => {
                let body = json!({
                    "result": "error",
                    "message": "Ошибка валидации данных",
                    "details": details,
                });
                (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response()
            }
            ApiError::Unauthorized => {
                let body = json!({
                    "result": "error",
                    "message": "Неверные логин или пароль",
                });
                (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic")],
                    axum::Json(body),
                )
                    .into_response()
            }
            ApiError::Forbidden => error_response(
                StatusCode::FORBIDDEN,
                "Недостаточно прав для выполнения операции",
            ),
            ApiError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "Пользователь не найден")
            }
            ApiError::EmailTaken => {
                error_response(StatusCode::CONFLICT, "Email уже используется")
            }
            ApiError::Database(err) => {
                if is_unique_violation(&err) {
                    return ApiError::EmailTaken.into_response();
                }
                tracing::error!(error = %err, "database error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка сервера")
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Ошибка сервера")
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "result": "error",
        "message": message,
    });
    (status, axum::Json(body)).into_response()
}

/// Unique-constraint breaches surface as 409; the only unique column is the
/// user email.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
