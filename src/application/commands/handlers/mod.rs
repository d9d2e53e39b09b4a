//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod book_handlers;
mod generation_handlers;

pub use book_handlers::*;
pub use generation_handlers::*;
