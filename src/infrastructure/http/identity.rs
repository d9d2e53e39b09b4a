//! Caller Identity Extractor
//!
//! 调用方身份由前置鉴权层写入 `X-User-Id` 请求头（UUID）

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use crate::domain::book::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

/// 已鉴权的调用方
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

        let uuid = Uuid::parse_str(value)
            .map_err(|_| ApiError::Unauthorized("Invalid caller identity".to_string()))?;

        Ok(CallerIdentity(UserId::from_uuid(uuid)))
    }
}
