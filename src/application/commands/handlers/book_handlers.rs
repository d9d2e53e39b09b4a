//! Book Command Handlers

use std::sync::Arc;

use crate::application::commands::CreateBook;
use crate::application::error::ApplicationError;
use crate::application::ports::BookRepositoryPort;
use crate::domain::book::Book;

/// CreateBook Handler - 创建 draft 状态的绘本
pub struct CreateBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl CreateBookHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, command: CreateBook) -> Result<Book, ApplicationError> {
        let book = Book::new(command.owner, command.input)?;

        self.book_repo.save(&book).await?;

        tracing::info!(
            book_id = %book.id(),
            owner_id = %book.owner_id(),
            art_style = %book.input().art_style,
            "Book created (draft)"
        );

        Ok(book)
    }
}
