//! Book Queries

use crate::domain::book::{BookId, UserId};

/// 获取绘本详情查询（仅限拥有者）
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: BookId,
    pub caller: UserId,
}
