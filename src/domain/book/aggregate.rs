//! Book Context - Aggregate Root

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookError, BookId, BookStatus, FailureReason, Page, UserId};

/// 创建绘本时的输入字段（创建后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    pub character_name: String,
    pub character_age: Option<u32>,
    pub story_prompt: String,
    #[serde(default)]
    pub included_elements: Vec<String>,
    pub art_style: String,
    pub character_photo_url: Option<String>,
}

/// 从持久化层恢复聚合时使用的完整字段集
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    pub id: BookId,
    pub owner_id: UserId,
    pub input: BookInput,
    pub status: BookStatus,
    pub title: Option<String>,
    pub pages: Vec<Page>,
    pub cover_image_url: Option<String>,
    pub failure_reason: Option<FailureReason>,
    pub generation_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 派生字段的部分更新（字段覆盖语义）
///
/// `Option<Option<T>>` 中外层 None 表示不修改，`Some(None)` 表示清空。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub status: Option<BookStatus>,
    pub title: Option<String>,
    pub pages: Option<Vec<Page>>,
    pub cover_image_url: Option<Option<String>>,
    pub failure_reason: Option<Option<FailureReason>>,
    pub generation_started_at: Option<Option<DateTime<Utc>>>,
}

impl BookUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: BookStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn cover_image_url(mut self, url: Option<String>) -> Self {
        self.cover_image_url = Some(url);
        self
    }

    pub fn failure_reason(mut self, reason: Option<FailureReason>) -> Self {
        self.failure_reason = Some(reason);
        self
    }

    pub fn generation_started_at(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.generation_started_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Book 聚合根
///
/// 不变量:
/// - 输入字段创建后不可变，派生字段只由生成流程写入
/// - 页序一旦确定不再改变
/// - status=ready 时至少有一页带有插图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    owner_id: UserId,
    input: BookInput,
    status: BookStatus,
    title: Option<String>,
    pages: Vec<Page>,
    cover_image_url: Option<String>,
    failure_reason: Option<FailureReason>,
    generation_started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    /// 创建草稿状态的绘本
    pub fn new(owner_id: UserId, input: BookInput) -> Result<Self, BookError> {
        if input.character_name.trim().is_empty() {
            return Err(BookError::InvalidInput(
                "character name cannot be empty".to_string(),
            ));
        }
        if input.story_prompt.trim().is_empty() {
            return Err(BookError::InvalidInput(
                "story prompt cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: BookId::new(),
            owner_id,
            input,
            status: BookStatus::Draft,
            title: None,
            pages: Vec::new(),
            cover_image_url: None,
            failure_reason: None,
            generation_started_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// 从持久化数据恢复
    pub fn restore(snapshot: BookSnapshot) -> Self {
        Self {
            id: snapshot.id,
            owner_id: snapshot.owner_id,
            input: snapshot.input,
            status: snapshot.status,
            title: snapshot.title,
            pages: snapshot.pages,
            cover_image_url: snapshot.cover_image_url,
            failure_reason: snapshot.failure_reason,
            generation_started_at: snapshot.generation_started_at,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// 应用部分更新
    pub fn apply(&mut self, update: &BookUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(title) = &update.title {
            self.title = Some(title.clone());
        }
        if let Some(pages) = &update.pages {
            self.pages = pages.clone();
        }
        if let Some(cover) = &update.cover_image_url {
            self.cover_image_url = cover.clone();
        }
        if let Some(reason) = update.failure_reason {
            self.failure_reason = reason;
        }
        if let Some(at) = update.generation_started_at {
            self.generation_started_at = at;
        }
        self.updated_at = Utc::now();
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner_id == *user
    }

    /// `generating` 状态是否已超过允许时长（外部超时中断后遗留）
    pub fn is_generation_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        if self.status != BookStatus::Generating {
            return false;
        }
        match self.generation_started_at {
            Some(started) => now - started >= stale_after,
            None => true,
        }
    }

    /// 检查是否可以开始新一轮生成
    pub fn ensure_can_start_generation(
        &self,
        now: DateTime<Utc>,
        stale_after: Duration,
    ) -> Result<(), BookError> {
        if self.status == BookStatus::Generating && !self.is_generation_stale(now, stale_after) {
            return Err(BookError::AlreadyGenerating(self.id));
        }
        Ok(())
    }

    /// 有效的参考照片 URL（空白视为未提供）
    pub fn reference_photo_url(&self) -> Option<&str> {
        self.input
            .character_photo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn illustrated_page_count(&self) -> usize {
        self.pages.iter().filter(|p| p.has_illustration()).count()
    }

    // Getters
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    pub fn input(&self) -> &BookInput {
        &self.input
    }

    pub fn status(&self) -> BookStatus {
        self.status
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn cover_image_url(&self) -> Option<&str> {
        self.cover_image_url.as_deref()
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }

    pub fn generation_started_at(&self) -> Option<DateTime<Utc>> {
        self.generation_started_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
