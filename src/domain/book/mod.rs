//! Book Context - 绘本限界上下文
//!
//! 职责:
//! - 绘本聚合及状态机（draft → generating → ready/failed）
//! - 页面实体
//! - 派生字段的部分更新

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{Book, BookInput, BookSnapshot, BookUpdate};
pub use entities::Page;
pub use errors::BookError;
pub use value_objects::{BookId, BookStatus, FailureReason, UserId};
