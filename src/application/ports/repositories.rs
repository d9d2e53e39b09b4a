//! Repository Ports - 出站端口
//!
//! 绘本记录存储的抽象接口：按 ID 读取、按 ID 部分更新。
//! 具体实现在 infrastructure 层（SQLite / 内存）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::book::{Book, BookId, BookUpdate};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存新绘本
    async fn save(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 根据 ID 查找绘本
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// 部分更新（字段覆盖），绘本不存在时返回 NotFound
    async fn update(&self, id: BookId, update: &BookUpdate) -> Result<(), RepositoryError>;

    /// 原子地占用生成权
    ///
    /// 仅当绘本不处于 `generating`，或其 `generation_started_at` 早于 `stale_before` 时
    /// 应用 `update` 并返回更新后的绘本；否则返回 `Ok(None)`。
    async fn claim_for_generation(
        &self,
        id: BookId,
        stale_before: DateTime<Utc>,
        update: &BookUpdate,
    ) -> Result<Option<Book>, RepositoryError>;
}
