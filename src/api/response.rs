use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// The `{status_code, message, data}` envelope every JSON endpoint answers
/// with, successes and failures alike.
#[derive(Debug, Serialize)]
pub struct StandardResponse<T: Serialize> {
    pub status_code: u16,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T: Serialize> StandardResponse<T> {
    pub fn ok(data: T) -> Self {
        StandardResponse {
            status_code: 200,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: &str, data: T) -> Self {
        StandardResponse {
            status_code: 200,
            message: Some(message.to_owned()),
            data: Some(data),
        }
    }

    pub fn created(message: &str, data: T) -> Self {
        StandardResponse {
            status_code: 201,
            message: Some(message.to_owned()),
            data: Some(data),
        }
    }
}

impl StandardResponse<()> {
    pub fn message(message: &str) -> Self {
        StandardResponse {
            status_code: 200,
            message: Some(message.to_owned()),
            data: None,
        }
    }

    pub fn created_message(message: &str) -> Self {
        StandardResponse {
            status_code: 201,
            message: Some(message.to_owned()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for StandardResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Fixed status/detail pairs; every failure is terminal for its request.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Could not validate credentials")]
    AuthFailed,
    #[error("Captcha validation failed")]
    CaptchaFailed,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Not found")]
    NotFound,
    #[error("Invalid operation")]
    InvalidOperation,
    #[error("Resource conflict")]
    Conflict,
    #[error("Internal server error")]
    Database(#[from] DbErr),
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthFailed => StatusCode::UNAUTHORIZED,
            ApiError::CaptchaFailed => StatusCode::BAD_REQUEST,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidOperation => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(err) => tracing::error!(error = %err, "Database failure"),
            ApiError::Internal(detail) => tracing::error!(detail, "Internal failure"),
            _ => {}
        }

        StandardResponse::<()> {
            status_code: self.status().as_u16(),
            message: Some(self.to_string()),
            data: None,
        }
        .into_response()
    }
}
