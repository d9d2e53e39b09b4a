//! SQLite Book Repository

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{BookRepositoryPort, RepositoryError};
use crate::domain::book::{
    Book, BookId, BookInput, BookSnapshot, BookStatus, BookUpdate, FailureReason, Page, UserId,
};

const SELECT_COLUMNS: &str = "SELECT id, owner_id, character_name, character_age, story_prompt, \
     included_elements, art_style, character_photo_url, status, title, pages, cover_image_url, \
     failure_reason, generation_started_at, created_at, updated_at FROM books";

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// 时间戳统一为固定精度的 UTC RFC 3339，保证字符串比较与时间先后一致
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    owner_id: String,
    character_name: String,
    character_age: Option<i64>,
    story_prompt: String,
    included_elements: String,
    art_style: String,
    character_photo_url: Option<String>,
    status: String,
    title: Option<String>,
    pages: String,
    cover_image_url: Option<String>,
    failure_reason: Option<String>,
    generation_started_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let included_elements: Vec<String> = serde_json::from_str(&row.included_elements)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let pages: Vec<Page> = serde_json::from_str(&row.pages)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let status = BookStatus::from_str(&row.status).ok_or_else(|| {
            RepositoryError::SerializationError(format!("unknown book status: {}", row.status))
        })?;

        Ok(Book::restore(BookSnapshot {
            id: BookId::from_uuid(parse_uuid(&row.id)?),
            owner_id: UserId::from_uuid(parse_uuid(&row.owner_id)?),
            input: BookInput {
                character_name: row.character_name,
                character_age: row.character_age.map(|age| age as u32),
                story_prompt: row.story_prompt,
                included_elements,
                art_style: row.art_style,
                character_photo_url: row.character_photo_url,
            },
            status,
            title: row.title,
            pages,
            cover_image_url: row.cover_image_url,
            // 未知的失败原因按内部错误处理
            failure_reason: row
                .failure_reason
                .map(|r| FailureReason::from_str(&r).unwrap_or(FailureReason::Internal)),
            generation_started_at: row
                .generation_started_at
                .as_deref()
                .map(parse_ts)
                .transpose()?,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        }))
    }
}

/// 追加 `SET` 子句（总是刷新 updated_at）
fn push_assignments(
    builder: &mut QueryBuilder<'_, Sqlite>,
    update: &BookUpdate,
) -> Result<(), RepositoryError> {
    builder.push("UPDATE books SET updated_at = ");
    builder.push_bind(format_ts(Utc::now()));

    if let Some(status) = update.status {
        builder.push(", status = ").push_bind(status.as_str());
    }
    if let Some(title) = &update.title {
        builder.push(", title = ").push_bind(title.clone());
    }
    if let Some(pages) = &update.pages {
        let pages = serde_json::to_string(pages)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        builder.push(", pages = ").push_bind(pages);
    }
    if let Some(cover) = &update.cover_image_url {
        builder.push(", cover_image_url = ").push_bind(cover.clone());
    }
    if let Some(reason) = update.failure_reason {
        builder
            .push(", failure_reason = ")
            .push_bind(reason.map(|r| r.as_str()));
    }
    if let Some(started_at) = update.generation_started_at {
        builder
            .push(", generation_started_at = ")
            .push_bind(started_at.map(format_ts));
    }

    Ok(())
}

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        let input = book.input();
        let included_elements = serde_json::to_string(&input.included_elements)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let pages = serde_json::to_string(book.pages())
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO books (
                id, owner_id, character_name, character_age, story_prompt, included_elements,
                art_style, character_photo_url, status, title, pages, cover_image_url,
                failure_reason, generation_started_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(book.id().to_string())
        .bind(book.owner_id().to_string())
        .bind(&input.character_name)
        .bind(input.character_age.map(i64::from))
        .bind(&input.story_prompt)
        .bind(included_elements)
        .bind(&input.art_style)
        .bind(&input.character_photo_url)
        .bind(book.status().as_str())
        .bind(book.title())
        .bind(pages)
        .bind(book.cover_image_url())
        .bind(book.failure_reason().map(|r| r.as_str()))
        .bind(book.generation_started_at().map(format_ts))
        .bind(format_ts(book.created_at()))
        .bind(format_ts(book.updated_at()))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(book.id().to_string())
            }
            other => db_error(other),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row: Option<BookRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Book::try_from).transpose()
    }

    async fn update(&self, id: BookId, update: &BookUpdate) -> Result<(), RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        push_assignments(&mut builder, update)?;
        builder.push(" WHERE id = ").push_bind(id.to_string());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn claim_for_generation(
        &self,
        id: BookId,
        stale_before: DateTime<Utc>,
        update: &BookUpdate,
    ) -> Result<Option<Book>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        push_assignments(&mut builder, update)?;
        builder.push(" WHERE id = ").push_bind(id.to_string());
        builder.push(" AND (status != 'generating' OR generation_started_at IS NULL OR generation_started_at <= ");
        builder.push_bind(format_ts(stale_before));
        builder.push(")");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(id).await? {
                Some(_) => Ok(None),
                None => Err(RepositoryError::NotFound(id.to_string())),
            };
        }

        self.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use chrono::Duration;

    async fn repo() -> SqliteBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookRepository::new(pool)
    }

    fn book() -> Book {
        Book::new(
            UserId::from_uuid(Uuid::new_v4()),
            BookInput {
                character_name: "Noah".to_string(),
                character_age: Some(7),
                story_prompt: "Noah finds a dragon egg".to_string(),
                included_elements: vec!["grandma".to_string(), "a green scarf".to_string()],
                art_style: "fantasy".to_string(),
                character_photo_url: Some("https://photos.example/noah.jpg".to_string()),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find_round_trip() {
        let repo = repo().await;
        let book = book();
        repo.save(&book).await.unwrap();

        let found = repo.find_by_id(book.id()).await.unwrap().unwrap();
        assert_eq!(found.id(), book.id());
        assert_eq!(found.owner_id(), book.owner_id());
        assert_eq!(found.input(), book.input());
        assert_eq!(found.status(), BookStatus::Draft);
        assert!(found.pages().is_empty());

        assert!(matches!(
            repo.save(&book).await,
            Err(RepositoryError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_update_overwrites_only_given_fields() {
        let repo = repo().await;
        let book = book();
        repo.save(&book).await.unwrap();

        let mut page = Page::new(1, "Noah woke up.", "a boy waking up").unwrap();
        page.attach_illustration("https://img.example/1.png");
        let update = BookUpdate::new()
            .title("The Dragon Egg")
            .pages(vec![page.clone(), Page::new(2, "He ran.", "").unwrap()])
            .cover_image_url(Some("https://img.example/1.png".to_string()))
            .status(BookStatus::Ready);
        repo.update(book.id(), &update).await.unwrap();

        let found = repo.find_by_id(book.id()).await.unwrap().unwrap();
        assert_eq!(found.title(), Some("The Dragon Egg"));
        assert_eq!(found.pages().len(), 2);
        assert_eq!(found.pages()[0], page);
        assert_eq!(found.cover_image_url(), Some("https://img.example/1.png"));
        assert_eq!(found.status(), BookStatus::Ready);
        assert_eq!(found.input(), book.input());

        // Some(None) 清空字段
        repo.update(book.id(), &BookUpdate::new().cover_image_url(None))
            .await
            .unwrap();
        let found = repo.find_by_id(book.id()).await.unwrap().unwrap();
        assert!(found.cover_image_url().is_none());
        assert_eq!(found.title(), Some("The Dragon Egg"));
    }

    #[tokio::test]
    async fn test_update_missing_book() {
        let repo = repo().await;
        let result = repo
            .update(BookId::new(), &BookUpdate::new().status(BookStatus::Failed))
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failure_reason_persisted() {
        let repo = repo().await;
        let book = book();
        repo.save(&book).await.unwrap();

        repo.update(
            book.id(),
            &BookUpdate::new()
                .status(BookStatus::Failed)
                .failure_reason(Some(FailureReason::InsufficientCredit)),
        )
        .await
        .unwrap();

        let found = repo.find_by_id(book.id()).await.unwrap().unwrap();
        assert_eq!(found.failure_reason(), Some(FailureReason::InsufficientCredit));
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_until_stale() {
        let repo = repo().await;
        let book = book();
        repo.save(&book).await.unwrap();

        let now = Utc::now();
        let claim = BookUpdate::new()
            .status(BookStatus::Generating)
            .failure_reason(None)
            .generation_started_at(Some(now));
        let stale_after = Duration::seconds(360);

        let claimed = repo
            .claim_for_generation(book.id(), now - stale_after, &claim)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.status(), BookStatus::Generating);

        let again = repo
            .claim_for_generation(book.id(), now - stale_after, &claim)
            .await
            .unwrap();
        assert!(again.is_none());

        // 时间推进到超时之后
        let later = now + Duration::minutes(10);
        let reclaimed = repo
            .claim_for_generation(
                book.id(),
                later - stale_after,
                &claim.clone().generation_started_at(Some(later)),
            )
            .await
            .unwrap();
        assert!(reclaimed.is_some());
    }

    #[tokio::test]
    async fn test_claim_missing_book() {
        let repo = repo().await;
        let result = repo
            .claim_for_generation(BookId::new(), Utc::now(), &BookUpdate::new())
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
