//! Generation Commands

use crate::domain::book::{BookId, UserId};

/// 完整生成命令：故事文本 + 全部插图
#[derive(Debug, Clone)]
pub struct GenerateBook {
    pub book_id: BookId,
    pub caller: UserId,
}

/// 只为尚无插图的页面重新生成插图
#[derive(Debug, Clone)]
pub struct RegenerateIllustrations {
    pub book_id: BookId,
    pub caller: UserId,
}
