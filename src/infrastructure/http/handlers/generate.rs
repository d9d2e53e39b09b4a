//! Generation HTTP Handlers
//!
//! 请求在整个生成流程结束后才返回

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GenerateBook, GenerationOutcome, RegenerateIllustrations};
use crate::domain::book::BookId;
use crate::infrastructure::http::dto::{ApiResponse, GenerateRequest, GenerateResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::identity::CallerIdentity;
use crate::infrastructure::http::state::AppState;

/// 生成整本绘本（故事文本 + 插图）
pub async fn generate_book(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, ApiError> {
    let command = GenerateBook {
        book_id: BookId::from_uuid(req.book_id),
        caller,
    };

    let outcome = state.generate_book_handler.handle(command).await?;

    respond(outcome)
}

/// 只补齐缺失的插图
pub async fn generate_images(
    State(state): State<Arc<AppState>>,
    CallerIdentity(caller): CallerIdentity,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, ApiError> {
    let command = RegenerateIllustrations {
        book_id: BookId::from_uuid(req.book_id),
        caller,
    };

    let outcome = state.regenerate_illustrations_handler.handle(command).await?;

    respond(outcome)
}

fn respond(outcome: GenerationOutcome) -> Result<Json<ApiResponse<GenerateResponse>>, ApiError> {
    match outcome.failure_reason {
        Some(reason) => Err(ApiError::from_failure(reason)),
        None => Ok(Json(ApiResponse::success(GenerateResponse::from(&outcome)))),
    }
}
