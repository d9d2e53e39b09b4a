//! Book Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 绘本唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 调用方身份（由上游鉴权层确定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 绘本生成状态
///
/// draft → generating → {ready, failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// 草稿，尚未生成
    Draft,
    /// 生成中（同一时刻只允许一个生成流程）
    Generating,
    /// 已就绪
    Ready,
    /// 生成失败
    Failed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Draft => "draft",
            BookStatus::Generating => "generating",
            BookStatus::Ready => "ready",
            BookStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BookStatus::Draft),
            "generating" => Some(BookStatus::Generating),
            "ready" => Some(BookStatus::Ready),
            "failed" => Some(BookStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookStatus::Ready | BookStatus::Failed)
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Draft
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生成失败原因分类
///
/// 额度不足与普通失败的补救方式不同，需要单独区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// 上游账户额度不足
    InsufficientCredit,
    /// 故事文本生成失败
    StoryGeneration,
    /// 模型返回的故事结构无效
    InvalidStory,
    /// 所有插图均生成失败
    IllustrationsFailed,
    /// 内部错误
    Internal,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InsufficientCredit => "insufficient_credit",
            FailureReason::StoryGeneration => "story_generation",
            FailureReason::InvalidStory => "invalid_story",
            FailureReason::IllustrationsFailed => "illustrations_failed",
            FailureReason::Internal => "internal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "insufficient_credit" => Some(FailureReason::InsufficientCredit),
            "story_generation" => Some(FailureReason::StoryGeneration),
            "invalid_story" => Some(FailureReason::InvalidStory),
            "illustrations_failed" => Some(FailureReason::IllustrationsFailed),
            "internal" => Some(FailureReason::Internal),
            _ => None,
        }
    }

    /// 面向用户的提示信息
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureReason::InsufficientCredit => {
                "The illustration provider account has insufficient credit. Add credit to the provider account, then try again."
            }
            FailureReason::StoryGeneration => "Story generation failed. Please try again.",
            FailureReason::InvalidStory => {
                "The generated story could not be understood. Please try again."
            }
            FailureReason::IllustrationsFailed => {
                "Illustrations failed to generate. Please try again."
            }
            FailureReason::Internal => "Generation failed due to an internal error.",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            BookStatus::Draft,
            BookStatus::Generating,
            BookStatus::Ready,
            BookStatus::Failed,
        ] {
            assert_eq!(BookStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(BookStatus::from_str("processing"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BookStatus::Ready.is_terminal());
        assert!(BookStatus::Failed.is_terminal());
        assert!(!BookStatus::Generating.is_terminal());
        assert!(!BookStatus::Draft.is_terminal());
    }

    #[test]
    fn test_failure_reason_serde_uses_snake_case() {
        let json = serde_json::to_string(&FailureReason::InsufficientCredit).unwrap();
        assert_eq!(json, "\"insufficient_credit\"");
    }
}
