//! Illustration Batch - 整本书插图顺序生成
//!
//! 严格串行，每两次实际上游调用之间固定等待 `inter_call_delay`（最后一次之后不等待）。
//! 插图描述为空的页面直接跳过，不发起调用。
//! 单页失败只记录为 `image_url = None`，不会让整批失败；配置错误中止整批。

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{IllustratorError, IllustratorPort};

/// 单页插图任务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIllustrationJob {
    pub page_number: u32,
    pub image_prompt: String,
}

/// 单页插图结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationResult {
    pub page_number: u32,
    pub image_url: Option<String>,
}

/// Illustration Batch Orchestrator
pub struct IllustrationBatch {
    illustrator: Arc<dyn IllustratorPort>,
    inter_call_delay: Duration,
}

impl IllustrationBatch {
    pub fn new(illustrator: Arc<dyn IllustratorPort>, inter_call_delay: Duration) -> Self {
        Self {
            illustrator,
            inter_call_delay,
        }
    }

    /// 按输入顺序生成插图，结果与输入一一对应
    pub async fn generate(
        &self,
        jobs: &[PageIllustrationJob],
        reference_photo_url: Option<&str>,
    ) -> Result<Vec<IllustrationResult>, IllustratorError> {
        let mut results = Vec::with_capacity(jobs.len());
        let mut calls_made = 0usize;

        for job in jobs {
            let prompt = job.image_prompt.trim();
            if prompt.is_empty() {
                tracing::debug!(page_number = job.page_number, "Skipping page without illustration prompt");
                results.push(IllustrationResult {
                    page_number: job.page_number,
                    image_url: None,
                });
                continue;
            }

            if calls_made > 0 && !self.inter_call_delay.is_zero() {
                tokio::time::sleep(self.inter_call_delay).await;
            }
            calls_made += 1;

            let image_url = self.illustrator.illustrate(prompt, reference_photo_url).await?;

            match &image_url {
                Some(_) => tracing::info!(page_number = job.page_number, "Page illustrated"),
                None => tracing::warn!(page_number = job.page_number, "Page illustration failed"),
            }

            results.push(IllustrationResult {
                page_number: job.page_number,
                image_url,
            });
        }

        Ok(results)
    }
}
