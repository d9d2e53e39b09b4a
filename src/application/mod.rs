//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（PredictionTransport、StoryWriter、Illustrator、Repository）
//! - services: 生成流水线各阶段（预测客户端、文本、插图、批量插图）
//! - commands: CQRS 命令及处理器（创建绘本、生成协调）
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    handlers::{
        CreateBookHandler, GenerateBookHandler, GenerationOutcome, GenerationSettings,
        GenerationSummary, RegenerateIllustrationsHandler, DEFAULT_FALLBACK_PHOTO_URL,
    },
    CreateBook, GenerateBook, RegenerateIllustrations,
};

pub use error::ApplicationError;

pub use ports::{
    // Illustrator
    IllustratorError,
    IllustratorPort,
    // Prediction transport
    PollHandle,
    Prediction,
    PredictionError,
    PredictionOutcome,
    PredictionOutput,
    PredictionStatus,
    PredictionTransportPort,
    PredictionUrls,
    SubmitResponse,
    // Repositories
    BookRepositoryPort,
    RepositoryError,
    // Story writer
    StoryWriterError,
    StoryWriterPort,
};

pub use queries::{handlers::GetBookHandler, GetBook};

pub use services::{
    IllustrationBatch, IllustrationGenerator, IllustrationGeneratorConfig, IllustrationResult,
    PageIllustrationJob, PredictionClient, PredictionClientConfig, PredictionRequest,
    TextGenerator, TextGeneratorConfig, STYLE_ANCHOR,
};
