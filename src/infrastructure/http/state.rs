//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CreateBookHandler, GenerateBookHandler, GenerationSettings, RegenerateIllustrationsHandler,
    // Query handlers
    GetBookHandler,
    // Ports / services
    BookRepositoryPort, IllustrationBatch, StoryWriterPort,
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub book_repo: Arc<dyn BookRepositoryPort>,

    // ========== Command Handlers ==========
    pub create_book_handler: CreateBookHandler,
    pub generate_book_handler: GenerateBookHandler,
    pub regenerate_illustrations_handler: RegenerateIllustrationsHandler,

    // ========== Query Handlers ==========
    pub get_book_handler: GetBookHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        story_writer: Arc<dyn StoryWriterPort>,
        batch: Arc<IllustrationBatch>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            book_repo: book_repo.clone(),

            create_book_handler: CreateBookHandler::new(book_repo.clone()),
            generate_book_handler: GenerateBookHandler::new(
                book_repo.clone(),
                story_writer,
                batch.clone(),
                settings.clone(),
            ),
            regenerate_illustrations_handler: RegenerateIllustrationsHandler::new(
                book_repo.clone(),
                batch,
                settings,
            ),

            get_book_handler: GetBookHandler::new(book_repo),
        }
    }
}
