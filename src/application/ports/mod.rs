//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod illustrator;
mod prediction;
mod repositories;
mod story_writer;

pub use illustrator::{IllustratorError, IllustratorPort};
pub use prediction::{
    PollHandle, Prediction, PredictionError, PredictionOutcome, PredictionOutput,
    PredictionStatus, PredictionTransportPort, PredictionUrls, SubmitResponse,
};
pub use repositories::{BookRepositoryPort, RepositoryError};
pub use story_writer::{StoryWriterError, StoryWriterPort};
