//! Application Services - 生成流水线的各个阶段
//!
//! - PredictionClient: 上游预测提交、限流重试与轮询
//! - TextGenerator: 故事原始文本
//! - IllustrationGenerator: 单页插图
//! - IllustrationBatch: 整本书插图的串行节流

mod illustration_batch;
mod illustration_generator;
mod prediction_client;
mod text_generator;

pub use illustration_batch::{IllustrationBatch, IllustrationResult, PageIllustrationJob};
pub use illustration_generator::{
    IllustrationGenerator, IllustrationGeneratorConfig, STYLE_ANCHOR,
};
pub use prediction_client::{PredictionClient, PredictionClientConfig, PredictionRequest};
pub use text_generator::{TextGenerator, TextGeneratorConfig};
