use domain::{DomainError, RepositoryError};
use thiserror::Error;

/// 用例层错误。
///
/// 除 `Store` 外都是请求级错误，由调用方决定如何响应；`Store` 在请求中表现为
/// 通用失败，在后台清理任务中只记录日志。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("validation failed: {0}")]
    Validation(#[from] DomainError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

impl ApplicationError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApplicationError::Validation(DomainError::invalid_argument(field, reason))
    }

    pub fn participant_not_found(name: impl std::fmt::Display) -> Self {
        ApplicationError::NotFound(format!("participant '{name}'"))
    }

    pub fn message_not_found(id: impl std::fmt::Display) -> Self {
        ApplicationError::NotFound(format!("message {id}"))
    }
}
