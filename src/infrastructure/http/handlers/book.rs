//! Book HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CreateBook, GetBook};
use crate::domain::book::BookId;
use crate::infrastructure::http::dto::{ApiResponse, BookResponse, CreateBookRequest, GetBookRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::identity::CallerIdentity;
use crate::infrastructure::http::state::AppState;

/// 创建草稿绘本
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    CallerIdentity(owner): CallerIdentity,
    Json(req): Json<CreateBookRequest>,
) -> Result<Json<ApiResponse<BookResponse>>, ApiError> {
    let command = CreateBook {
        owner,
        input: req.into_input(),
    };

    let book = state.create_book_handler.handle(command).await?;

    Ok(Json(ApiResponse::success(BookResponse::from(&book))))
}

/// 获取绘本详情（仅所有者可见）
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    Json(req): Json<GetBookRequest>,
) -> Result<Json<ApiResponse<BookResponse>>, ApiError> {
    let query = GetBook {
        book_id: BookId::from_uuid(req.id),
        caller,
    };

    let book = state.get_book_handler.handle(query).await?;

    Ok(Json(ApiResponse::success(BookResponse::from(&book))))
}
