//! Book Commands

use crate::domain::book::{BookInput, UserId};

/// 创建草稿绘本命令
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub owner: UserId,
    pub input: BookInput,
}
