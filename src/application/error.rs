//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{IllustratorError, RepositoryError, StoryWriterError};
use crate::domain::book::BookError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到（或不属于调用者）
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 与当前状态冲突（例如正在生成中）
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 部署配置缺陷（凭证缺失等），不归咎于绘本本身
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<BookError> for ApplicationError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound(id) => Self::not_found("Book", *id.as_uuid()),
            BookError::AlreadyGenerating(id) => {
                Self::Conflict(format!("Book {} is already being generated", id))
            }
            BookError::InvalidInput(msg) => Self::ValidationError(msg),
            BookError::NoPages(_) => {
                Self::ValidationError("Book has no pages. Generate the story first.".to_string())
            }
        }
    }
}

impl From<IllustratorError> for ApplicationError {
    fn from(err: IllustratorError) -> Self {
        match err {
            IllustratorError::Configuration(msg) => Self::Configuration(msg),
        }
    }
}

impl From<StoryWriterError> for ApplicationError {
    fn from(err: StoryWriterError) -> Self {
        match err {
            StoryWriterError::Configuration(msg) => Self::Configuration(msg),
            other => Self::InternalError(other.to_string()),
        }
    }
}
