//! Story Writer Port - 故事文本生成抽象
//!
//! 只负责把一条提示词变成原始文本，不解析故事结构

use async_trait::async_trait;
use thiserror::Error;

/// 故事文本生成错误
#[derive(Debug, Error)]
pub enum StoryWriterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Insufficient upstream credit: {0}")]
    InsufficientCredit(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Story generation job failed: {0}")]
    JobFailed(String),

    #[error("Story generation timed out after {polls} polls")]
    TimedOut { polls: u32 },

    #[error("Malformed story output: {0}")]
    MalformedOutput(String),

    #[error("Story generation returned no text")]
    EmptyOutput,
}

/// Story Writer Port
#[async_trait]
pub trait StoryWriterPort: Send + Sync {
    /// 生成原始故事文本
    async fn write_story(&self, prompt: &str) -> Result<String, StoryWriterError>;
}
