//! Book Context - Errors

use thiserror::Error;

use super::BookId;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("Book not found: {0}")]
    NotFound(BookId),

    #[error("Book is already being generated: {0}")]
    AlreadyGenerating(BookId),

    #[error("Invalid book input: {0}")]
    InvalidInput(String),

    #[error("Book has no pages: {0}")]
    NoPages(BookId),
}
