use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.to_owned(),
                message: message.into(),
            },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Validation(DomainError::InvalidArgument { field, reason }) => {
                ApiError::validation(format!("{field}: {reason}"))
            }
            ApplicationError::Conflict(message) => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", message)
            }
            ApplicationError::NotFound(message) => {
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{message} not found"))
            }
            ApplicationError::Authorization(message) => {
                ApiError::new(StatusCode::UNAUTHORIZED, "NOT_OWNER", message)
            }
            ApplicationError::Store(err) => {
                // 存储细节只写日志，不返回给调用方
                tracing::error!(error = %err, "请求处理时存储失败");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "internal storage error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
