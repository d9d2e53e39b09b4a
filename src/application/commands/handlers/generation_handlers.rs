//! Generation Command Handlers - 绘本生成协调
//!
//! 状态机: draft → generating → {ready, failed}；ready / failed 可以通过新请求重新进入。
//!
//! 一次完整生成最多三次持久化写入:
//! 1. 占用生成权（status=generating）
//! 2. 故事文本检查点（title + pages）
//! 3. 最终结果（插图 + 封面 + status）
//!
//! 失败路径额外写入一次 failed。配置错误不归咎于绘本，恢复之前的状态后向上返回。

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::application::commands::{GenerateBook, RegenerateIllustrations};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRepositoryPort, IllustratorError, StoryWriterError, StoryWriterPort,
};
use crate::application::services::{IllustrationBatch, PageIllustrationJob};
use crate::domain::book::{
    Book, BookError, BookId, BookStatus, BookUpdate, FailureReason, Page, UserId,
};
use crate::domain::{build_story_prompt, parse_story, ArtStyleCatalog};

/// 未提供角色照片时使用的参考照片
pub const DEFAULT_FALLBACK_PHOTO_URL: &str =
    "https://images.unsplash.com/photo-1503454537195-1dcabb73ffb9?w=600&h=800&fit=crop";

/// 生成流程设置
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub art_styles: ArtStyleCatalog,
    pub fallback_photo_url: String,
    /// `generating` 超过该时长视为被外部中断，可重新进入
    pub stale_after: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            art_styles: ArtStyleCatalog::default(),
            fallback_photo_url: DEFAULT_FALLBACK_PHOTO_URL.to_string(),
            stale_after: Duration::seconds(360),
        }
    }
}

/// 插图统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 没有插图的页码（升序）
    pub failed_pages: Vec<u32>,
}

impl GenerationSummary {
    pub fn from_pages(pages: &[Page]) -> Self {
        let failed_pages: Vec<u32> = pages
            .iter()
            .filter(|p| !p.has_illustration())
            .map(Page::page_number)
            .collect();
        Self {
            total: pages.len(),
            succeeded: pages.len() - failed_pages.len(),
            failed: failed_pages.len(),
            failed_pages,
        }
    }

    /// 部分失败时的提示，例如 "2 of 12 illustrations failed (pages 3, 7)"
    pub fn partial_failure_note(&self) -> Option<String> {
        if self.failed == 0 || self.succeeded == 0 {
            return None;
        }
        let pages = self
            .failed_pages
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "{} of {} illustrations failed (pages {})",
            self.failed, self.total, pages
        ))
    }
}

/// 一次生成的结果
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub book: Book,
    pub status: BookStatus,
    pub summary: GenerationSummary,
    pub failure_reason: Option<FailureReason>,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Text,
    Parse,
    Checkpoint,
    Finalize,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Text => "text",
            Stage::Parse => "parse",
            Stage::Checkpoint => "checkpoint",
            Stage::Finalize => "finalize",
        }
    }
}

/// 一次运行内部的终止原因
#[derive(Debug)]
enum RunError {
    Configuration(String),
    Failed {
        stage: Stage,
        reason: FailureReason,
        detail: String,
    },
}

impl RunError {
    fn failed(stage: Stage, reason: FailureReason, detail: impl std::fmt::Display) -> Self {
        RunError::Failed {
            stage,
            reason,
            detail: detail.to_string(),
        }
    }
}

impl From<IllustratorError> for RunError {
    fn from(err: IllustratorError) -> Self {
        match err {
            IllustratorError::Configuration(msg) => RunError::Configuration(msg),
        }
    }
}

/// 两个生成入口共用的流程
#[derive(Clone)]
struct GenerationPipeline {
    book_repo: Arc<dyn BookRepositoryPort>,
    batch: Arc<IllustrationBatch>,
    settings: GenerationSettings,
}

impl GenerationPipeline {
    /// 读取调用者拥有的绘本；不属于调用者时与不存在一样处理
    async fn load_owned(&self, id: BookId, caller: &UserId) -> Result<Book, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", *id.as_uuid()))?;

        if !book.is_owned_by(caller) {
            tracing::warn!(book_id = %id, caller = %caller, "Book requested by non-owner");
            return Err(ApplicationError::not_found("Book", *id.as_uuid()));
        }

        Ok(book)
    }

    /// 原子地把绘本标记为 generating
    async fn claim(&self, book: &Book) -> Result<Book, ApplicationError> {
        let now = Utc::now();
        book.ensure_can_start_generation(now, self.settings.stale_after)?;

        if book.status() == BookStatus::Generating {
            tracing::warn!(
                book_id = %book.id(),
                started_at = ?book.generation_started_at(),
                "Re-entering abandoned generation"
            );
        }

        let update = BookUpdate::new()
            .status(BookStatus::Generating)
            .failure_reason(None)
            .generation_started_at(Some(now));

        self.book_repo
            .claim_for_generation(book.id(), now - self.settings.stale_after, &update)
            .await?
            .ok_or_else(|| BookError::AlreadyGenerating(book.id()).into())
    }

    async fn write(&self, book: &mut Book, update: &BookUpdate, stage: Stage) -> Result<(), RunError> {
        self.book_repo
            .update(book.id(), update)
            .await
            .map_err(|e| RunError::failed(stage, FailureReason::Internal, e))?;
        book.apply(update);
        Ok(())
    }

    /// 为缺图页面生成插图，合并后写入最终状态
    async fn illustrate_and_finish(&self, book: &mut Book) -> Result<GenerationOutcome, RunError> {
        let jobs: Vec<PageIllustrationJob> = book
            .pages()
            .iter()
            .filter(|p| !p.has_illustration())
            .map(|p| PageIllustrationJob {
                page_number: p.page_number(),
                image_prompt: p.image_prompt().to_string(),
            })
            .collect();
        let reference = book
            .reference_photo_url()
            .unwrap_or(self.settings.fallback_photo_url.as_str())
            .to_string();

        tracing::info!(
            book_id = %book.id(),
            pages = jobs.len(),
            custom_photo = book.reference_photo_url().is_some(),
            "Generating illustrations"
        );

        let results = self.batch.generate(&jobs, Some(reference.as_str())).await?;

        let mut pages = book.pages().to_vec();
        for result in results {
            if let Some(url) = result.image_url {
                if let Some(page) = pages
                    .iter_mut()
                    .find(|p| p.page_number() == result.page_number)
                {
                    page.attach_illustration(url);
                }
            }
        }

        let summary = GenerationSummary::from_pages(&pages);
        let cover = pages.iter().find_map(Page::image_url).map(str::to_string);
        let (status, failure_reason) = if summary.succeeded == 0 {
            (BookStatus::Failed, Some(FailureReason::IllustrationsFailed))
        } else {
            (BookStatus::Ready, None)
        };

        let update = BookUpdate::new()
            .pages(pages)
            .cover_image_url(cover)
            .status(status)
            .failure_reason(failure_reason)
            .generation_started_at(None);
        self.write(book, &update, Stage::Finalize).await?;

        if status == BookStatus::Ready {
            tracing::info!(
                book_id = %book.id(),
                succeeded = summary.succeeded,
                failed = summary.failed,
                failed_pages = ?summary.failed_pages,
                "Book ready"
            );
        } else {
            tracing::error!(
                book_id = %book.id(),
                total = summary.total,
                "All illustrations failed"
            );
        }

        Ok(GenerationOutcome {
            book: book.clone(),
            status,
            summary,
            failure_reason,
        })
    }

    /// 运行中止后的收尾
    async fn settle(
        &self,
        mut book: Book,
        previous: &Book,
        err: RunError,
    ) -> Result<GenerationOutcome, ApplicationError> {
        match err {
            RunError::Configuration(msg) => {
                tracing::error!(
                    book_id = %book.id(),
                    error = %msg,
                    "Generation aborted by configuration error"
                );

                // ready 必须至少有一张插图，检查点可能已覆盖旧页面
                let restored = match previous.status() {
                    BookStatus::Generating => BookStatus::Draft,
                    BookStatus::Ready if book.illustrated_page_count() == 0 => BookStatus::Draft,
                    status => status,
                };
                let restore = BookUpdate::new()
                    .status(restored)
                    .failure_reason(previous.failure_reason())
                    .generation_started_at(None);
                if let Err(e) = self.book_repo.update(book.id(), &restore).await {
                    tracing::error!(
                        book_id = %book.id(),
                        error = %e,
                        "Failed to restore book after configuration error"
                    );
                }

                Err(ApplicationError::Configuration(msg))
            }
            RunError::Failed {
                stage,
                reason,
                detail,
            } => {
                tracing::error!(
                    book_id = %book.id(),
                    stage = stage.as_str(),
                    reason = reason.as_str(),
                    error = %detail,
                    "Generation failed"
                );

                let update = BookUpdate::new()
                    .status(BookStatus::Failed)
                    .failure_reason(Some(reason))
                    .generation_started_at(None);
                self.book_repo.update(book.id(), &update).await?;
                book.apply(&update);

                Ok(GenerationOutcome {
                    summary: GenerationSummary::from_pages(book.pages()),
                    status: BookStatus::Failed,
                    failure_reason: Some(reason),
                    book,
                })
            }
        }
    }
}

// ============================================================================
// GenerateBook
// ============================================================================

/// GenerateBook Handler - 故事文本 + 全部插图
pub struct GenerateBookHandler {
    pipeline: GenerationPipeline,
    story_writer: Arc<dyn StoryWriterPort>,
}

impl GenerateBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        story_writer: Arc<dyn StoryWriterPort>,
        batch: Arc<IllustrationBatch>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            pipeline: GenerationPipeline {
                book_repo,
                batch,
                settings,
            },
            story_writer,
        }
    }

    pub async fn handle(&self, command: GenerateBook) -> Result<GenerationOutcome, ApplicationError> {
        let previous = self
            .pipeline
            .load_owned(command.book_id, &command.caller)
            .await?;
        let mut book = self.pipeline.claim(&previous).await?;

        tracing::info!(
            book_id = %book.id(),
            previous_status = %previous.status(),
            "Book generation started"
        );

        match self.run(&mut book).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.pipeline.settle(book, &previous, err).await,
        }
    }

    async fn run(&self, book: &mut Book) -> Result<GenerationOutcome, RunError> {
        let style = self
            .pipeline
            .settings
            .art_styles
            .describe(&book.input().art_style);
        let prompt = build_story_prompt(book.input(), style);

        let raw = self
            .story_writer
            .write_story(&prompt)
            .await
            .map_err(|e| match e {
                StoryWriterError::Configuration(msg) => RunError::Configuration(msg),
                StoryWriterError::InsufficientCredit(detail) => {
                    RunError::failed(Stage::Text, FailureReason::InsufficientCredit, detail)
                }
                other => RunError::failed(Stage::Text, FailureReason::StoryGeneration, other),
            })?;

        let draft = parse_story(&raw)
            .map_err(|e| RunError::failed(Stage::Parse, FailureReason::InvalidStory, e))?;
        let pages = draft
            .to_pages()
            .map_err(|e| RunError::failed(Stage::Parse, FailureReason::InvalidStory, e))?;

        tracing::info!(
            book_id = %book.id(),
            title = %draft.title,
            pages = draft.pages.len(),
            "Story text generated"
        );

        // 检查点不改状态，最终写入前保持 generating
        let checkpoint = BookUpdate::new()
            .title(draft.title.clone())
            .pages(pages)
            .cover_image_url(None);
        self.pipeline
            .write(book, &checkpoint, Stage::Checkpoint)
            .await?;

        self.pipeline.illustrate_and_finish(book).await
    }
}

// ============================================================================
// RegenerateIllustrations
// ============================================================================

/// RegenerateIllustrations Handler - 只补齐缺失的插图
pub struct RegenerateIllustrationsHandler {
    pipeline: GenerationPipeline,
}

impl RegenerateIllustrationsHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        batch: Arc<IllustrationBatch>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            pipeline: GenerationPipeline {
                book_repo,
                batch,
                settings,
            },
        }
    }

    pub async fn handle(
        &self,
        command: RegenerateIllustrations,
    ) -> Result<GenerationOutcome, ApplicationError> {
        let previous = self
            .pipeline
            .load_owned(command.book_id, &command.caller)
            .await?;
        if previous.pages().is_empty() {
            return Err(BookError::NoPages(previous.id()).into());
        }

        let mut book = self.pipeline.claim(&previous).await?;

        tracing::info!(
            book_id = %book.id(),
            missing = book.pages().len() - book.illustrated_page_count(),
            "Illustration regeneration started"
        );

        match self.pipeline.illustrate_and_finish(&mut book).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.pipeline.settle(book, &previous, err).await,
        }
    }
}
