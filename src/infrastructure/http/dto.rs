//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{GenerationOutcome, GenerationSummary};
use crate::domain::book::{Book, BookInput, Page};
use crate::domain::DEFAULT_ART_STYLE;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub character_name: String,
    #[serde(default)]
    pub character_age: Option<u32>,
    pub story_prompt: String,
    #[serde(default)]
    pub included_elements: Vec<String>,
    #[serde(default)]
    pub art_style: Option<String>,
    #[serde(default)]
    pub character_photo_url: Option<String>,
}

impl CreateBookRequest {
    /// 未指定画风时使用默认画风
    pub fn into_input(self) -> BookInput {
        BookInput {
            character_name: self.character_name,
            character_age: self.character_age,
            story_prompt: self.story_prompt,
            included_elements: self.included_elements,
            art_style: self
                .art_style
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ART_STYLE.to_string()),
            character_photo_url: self.character_photo_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetBookRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page_number: u32,
    pub text: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
}

impl From<&Page> for PageResponse {
    fn from(page: &Page) -> Self {
        Self {
            page_number: page.page_number(),
            text: page.text().to_string(),
            image_prompt: page.image_prompt().to_string(),
            image_url: page.image_url().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub status: String,
    pub title: Option<String>,
    pub character_name: String,
    pub character_age: Option<u32>,
    pub story_prompt: String,
    pub included_elements: Vec<String>,
    pub art_style: String,
    pub character_photo_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub pages: Vec<PageResponse>,
    pub failure_reason: Option<String>,
    pub failure_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Book> for BookResponse {
    fn from(book: &Book) -> Self {
        let input = book.input();
        Self {
            id: *book.id().as_uuid(),
            status: book.status().as_str().to_string(),
            title: book.title().map(str::to_string),
            character_name: input.character_name.clone(),
            character_age: input.character_age,
            story_prompt: input.story_prompt.clone(),
            included_elements: input.included_elements.clone(),
            art_style: input.art_style.clone(),
            character_photo_url: input.character_photo_url.clone(),
            cover_image_url: book.cover_image_url().map(str::to_string),
            pages: book.pages().iter().map(PageResponse::from).collect(),
            failure_reason: book.failure_reason().map(|r| r.as_str().to_string()),
            failure_message: book.failure_reason().map(|r| r.user_message().to_string()),
            created_at: book.created_at().to_rfc3339(),
            updated_at: book.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_pages: Vec<u32>,
}

impl From<&GenerationSummary> for SummaryResponse {
    fn from(summary: &GenerationSummary) -> Self {
        Self {
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            failed_pages: summary.failed_pages.clone(),
        }
    }
}

/// 生成成功（ready）的响应
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: String,
    pub summary: SummaryResponse,
    /// 部分插图失败时的提示
    pub note: Option<String>,
    pub book: BookResponse,
}

impl From<&GenerationOutcome> for GenerateResponse {
    fn from(outcome: &GenerationOutcome) -> Self {
        Self {
            status: outcome.status.as_str().to_string(),
            summary: SummaryResponse::from(&outcome.summary),
            note: outcome.summary.partial_failure_note(),
            book: BookResponse::from(&outcome.book),
        }
    }
}
