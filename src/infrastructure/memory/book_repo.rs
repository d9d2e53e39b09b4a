//! In-Memory Book Repository
//!
//! 单进程部署和测试使用；`claim_for_generation` 在 DashMap 分片锁内完成比较与写入

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::application::ports::{BookRepositoryPort, RepositoryError};
use crate::domain::book::{Book, BookId, BookStatus, BookUpdate};

/// 内存绘本仓储
#[derive(Default)]
pub struct InMemoryBookRepository {
    /// book_id -> Book
    books: DashMap<BookId, Book>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[async_trait]
impl BookRepositoryPort for InMemoryBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        if self.books.contains_key(&book.id()) {
            return Err(RepositoryError::Duplicate(book.id().to_string()));
        }
        self.books.insert(book.id(), book.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.books.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: BookId, update: &BookUpdate) -> Result<(), RepositoryError> {
        let mut entry = self
            .books
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        entry.apply(update);
        Ok(())
    }

    async fn claim_for_generation(
        &self,
        id: BookId,
        stale_before: DateTime<Utc>,
        update: &BookUpdate,
    ) -> Result<Option<Book>, RepositoryError> {
        let mut entry = self
            .books
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        let claimable = entry.status() != BookStatus::Generating
            || entry
                .generation_started_at()
                .map_or(true, |started| started <= stale_before);
        if !claimable {
            return Ok(None);
        }

        entry.apply(update);
        Ok(Some(entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::{BookInput, UserId};
    use chrono::Duration;
    use uuid::Uuid;

    fn book() -> Book {
        Book::new(
            UserId::from_uuid(Uuid::new_v4()),
            BookInput {
                character_name: "Mia".to_string(),
                character_age: Some(5),
                story_prompt: "a castle adventure".to_string(),
                included_elements: vec![],
                art_style: "watercolor".to_string(),
                character_photo_url: None,
            },
        )
        .unwrap()
    }

    fn generating_since(at: DateTime<Utc>) -> BookUpdate {
        BookUpdate::new()
            .status(BookStatus::Generating)
            .generation_started_at(Some(at))
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemoryBookRepository::new();
        let book = book();
        repo.save(&book).await.unwrap();

        let found = repo.find_by_id(book.id()).await.unwrap().unwrap();
        assert_eq!(found.id(), book.id());
        assert!(matches!(
            repo.save(&book).await,
            Err(RepositoryError::Duplicate(_))
        ));
        assert!(repo.find_by_id(BookId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let repo = InMemoryBookRepository::new();
        let result = repo.update(BookId::new(), &BookUpdate::new().title("T")).await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_claim_rejects_fresh_generating() {
        let repo = InMemoryBookRepository::new();
        let book = book();
        repo.save(&book).await.unwrap();

        let now = Utc::now();
        let first = repo
            .claim_for_generation(book.id(), now - Duration::seconds(360), &generating_since(now))
            .await
            .unwrap();
        assert_eq!(first.unwrap().status(), BookStatus::Generating);

        let second = repo
            .claim_for_generation(book.id(), now - Duration::seconds(360), &generating_since(now))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_claim_allows_stale_generating() {
        let repo = InMemoryBookRepository::new();
        let book = book();
        repo.save(&book).await.unwrap();

        let long_ago = Utc::now() - Duration::minutes(30);
        repo.update(book.id(), &generating_since(long_ago)).await.unwrap();

        let now = Utc::now();
        let claimed = repo
            .claim_for_generation(book.id(), now - Duration::seconds(360), &generating_since(now))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.generation_started_at(), Some(now));
    }
}
