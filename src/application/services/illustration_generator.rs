//! Illustration Generator - 单页插图生成
//!
//! 每次调用都在页面描述前加上固定的画风锚点，保证整本书视觉风格一致。
//! 单页失败（限流耗尽、上游拒绝、任务失败、超时、输出无法识别）统一返回 `None`，
//! 只有配置错误向上传播。

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::prediction_client::{PredictionClient, PredictionRequest};
use crate::application::ports::{
    IllustratorError, IllustratorPort, PredictionError, PredictionOutcome,
};

/// 画风锚点
pub const STYLE_ANCHOR: &str = "Whimsical children's storybook illustration in soft watercolor and gouache style, gentle pastel color palette with warm golden lighting, hand-painted texture with soft edges, expressive cartoon characters with large eyes and rounded features, dreamy background with subtle bokeh, consistent with a premium printed children's picture book. No photorealism, no 3D rendering, no sharp edges. ";

/// Illustration Generator 配置
#[derive(Debug, Clone)]
pub struct IllustrationGeneratorConfig {
    /// 图像模型预测端点
    pub endpoint: String,
    /// 内联等待提示（秒）
    pub wait_secs: u64,
    /// 轮询次数上限
    pub poll_ceiling: u32,
    pub aspect_ratio: String,
}

impl IllustrationGeneratorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            wait_secs: 60,
            poll_ceiling: 60,
            aspect_ratio: "1:1".to_string(),
        }
    }
}

/// Illustration Generator
pub struct IllustrationGenerator {
    client: Arc<PredictionClient>,
    config: IllustrationGeneratorConfig,
}

impl IllustrationGenerator {
    pub fn new(client: Arc<PredictionClient>, config: IllustrationGeneratorConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, description: &str, reference_photo_url: Option<&str>) -> PredictionRequest {
        let mut input = json!({
            "prompt": format!("{}{}", STYLE_ANCHOR, description.trim()),
            "aspect_ratio": self.config.aspect_ratio,
        });
        if let Some(url) = reference_photo_url.map(str::trim).filter(|u| !u.is_empty()) {
            input["input_image"] = json!(url);
        }

        PredictionRequest {
            endpoint: self.config.endpoint.clone(),
            input,
            wait_secs: self.config.wait_secs,
            poll_ceiling: self.config.poll_ceiling,
        }
    }
}

#[async_trait]
impl IllustratorPort for IllustrationGenerator {
    async fn illustrate(
        &self,
        description: &str,
        reference_photo_url: Option<&str>,
    ) -> Result<Option<String>, IllustratorError> {
        let request = self.request(description, reference_photo_url);

        let outcome = match self.client.submit(&request).await {
            Ok(outcome) => outcome,
            Err(PredictionError::Configuration(msg)) => {
                return Err(IllustratorError::Configuration(msg));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Illustration request failed");
                return Ok(None);
            }
        };

        match outcome {
            PredictionOutcome::Succeeded(output) => match output.image_url() {
                Ok(url) => Ok(Some(url)),
                Err(e) => {
                    tracing::warn!(error = %e, "Illustration output unusable");
                    Ok(None)
                }
            },
            PredictionOutcome::Failed { .. } => Ok(None),
            PredictionOutcome::TimedOut { polls } => {
                tracing::warn!(polls = polls, "Illustration timed out");
                Ok(None)
            }
        }
    }
}
