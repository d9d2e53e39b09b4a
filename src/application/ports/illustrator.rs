//! Illustrator Port - 单页插图生成抽象

use async_trait::async_trait;
use thiserror::Error;

/// 插图生成错误
///
/// 只有配置错误会作为错误返回；单页任务失败以 `Ok(None)` 表示
#[derive(Debug, Error)]
pub enum IllustratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Illustrator Port
#[async_trait]
pub trait IllustratorPort: Send + Sync {
    /// 为一页生成插图，返回图片 URL；可恢复的失败返回 `Ok(None)`
    async fn illustrate(
        &self,
        description: &str,
        reference_photo_url: Option<&str>,
    ) -> Result<Option<String>, IllustratorError>;
}
