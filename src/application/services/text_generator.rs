//! Text Generator - 故事原始文本生成
//!
//! 通过 Prediction Client 调用文本模型，只返回原始文本，不解析故事结构

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::prediction_client::{PredictionClient, PredictionRequest};
use crate::application::ports::{
    PredictionError, PredictionOutcome, StoryWriterError, StoryWriterPort,
};

/// Text Generator 配置
#[derive(Debug, Clone)]
pub struct TextGeneratorConfig {
    /// 文本模型预测端点
    pub endpoint: String,
    /// 内联等待提示（秒）
    pub wait_secs: u64,
    /// 轮询次数上限
    pub poll_ceiling: u32,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl TextGeneratorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            wait_secs: 120,
            poll_ceiling: 120,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Text Generator
pub struct TextGenerator {
    client: Arc<PredictionClient>,
    config: TextGeneratorConfig,
}

impl TextGenerator {
    pub fn new(client: Arc<PredictionClient>, config: TextGeneratorConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, prompt: &str) -> PredictionRequest {
        PredictionRequest {
            endpoint: self.config.endpoint.clone(),
            input: json!({
                "prompt": prompt,
                "max_tokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }),
            wait_secs: self.config.wait_secs,
            poll_ceiling: self.config.poll_ceiling,
        }
    }
}

impl From<PredictionError> for StoryWriterError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Configuration(msg) => StoryWriterError::Configuration(msg),
            err if err.is_insufficient_credit() => StoryWriterError::InsufficientCredit(match err {
                PredictionError::UpstreamRejected { detail, .. } => detail,
                other => other.to_string(),
            }),
            PredictionError::MalformedOutput(msg) => StoryWriterError::MalformedOutput(msg),
            other => StoryWriterError::Upstream(other.to_string()),
        }
    }
}

#[async_trait]
impl StoryWriterPort for TextGenerator {
    async fn write_story(&self, prompt: &str) -> Result<String, StoryWriterError> {
        tracing::debug!(prompt_len = prompt.len(), "Requesting story text");

        let outcome = self.client.submit(&self.request(prompt)).await?;

        let output = match outcome {
            PredictionOutcome::Succeeded(output) => output,
            PredictionOutcome::Failed { status, error } => {
                return Err(StoryWriterError::JobFailed(
                    error.unwrap_or_else(|| format!("prediction {}", status.as_str())),
                ));
            }
            PredictionOutcome::TimedOut { polls } => {
                return Err(StoryWriterError::TimedOut { polls });
            }
        };

        let text = output.text()?;
        if text.trim().is_empty() {
            return Err(StoryWriterError::EmptyOutput);
        }

        tracing::debug!(text_len = text.len(), "Story text received");
        Ok(text)
    }
}
