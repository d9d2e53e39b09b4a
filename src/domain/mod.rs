//! Domain Layer - 领域层
//!
//! 包含:
//! - Book Context: 绘本聚合与状态机
//! - 故事结构解析
//! - 故事提示词构建

pub mod book;

mod prompt;
mod story;

pub use prompt::{
    build_story_prompt, builtin_art_styles, ArtStyleCatalog, BUILTIN_ART_STYLES,
    DEFAULT_ART_STYLE,
};
pub use story::{parse_story, strip_code_fences, StoryDraft, StoryPage, StoryParseError};
