//! Prediction Client - 预测提交与轮询
//!
//! 把上游协议的两种响应形态（内联完成 / 创建后轮询）统一为一次调用:
//! - 初次提交遇到 429 时按固定间隔重试（不重试轮询）
//! - 未到终态时按固定间隔轮询，直到终态或达到轮询上限
//! - 失败/取消/超时返回确定的 `PredictionOutcome`，而不是错误

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    PollHandle, Prediction, PredictionError, PredictionOutcome, PredictionOutput,
    PredictionStatus, PredictionTransportPort, SubmitResponse,
};

/// Prediction Client 配置
#[derive(Debug, Clone)]
pub struct PredictionClientConfig {
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 429 时初次提交的最大重试次数
    pub rate_limit_retries: u32,
    /// 429 重试间隔
    pub rate_limit_backoff: Duration,
}

impl Default for PredictionClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            rate_limit_retries: 3,
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}

/// 单次预测请求
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub endpoint: String,
    pub input: Value,
    /// 内联等待提示（秒）
    pub wait_secs: u64,
    /// 轮询次数上限
    pub poll_ceiling: u32,
}

/// Prediction Client
///
/// 无状态，调用之间不保留任何预测信息
pub struct PredictionClient {
    transport: Arc<dyn PredictionTransportPort>,
    config: PredictionClientConfig,
}

impl PredictionClient {
    pub fn new(transport: Arc<dyn PredictionTransportPort>, config: PredictionClientConfig) -> Self {
        Self { transport, config }
    }

    /// 提交预测并等待终态
    pub async fn submit(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionOutcome, PredictionError> {
        let prediction = self.create_with_retry(request).await?;

        match SubmitResponse::classify(prediction)? {
            SubmitResponse::Immediate(prediction) => Self::settle_immediate(prediction),
            SubmitResponse::Pending(handle) => self.poll(&handle, request.poll_ceiling).await,
        }
    }

    async fn create_with_retry(
        &self,
        request: &PredictionRequest,
    ) -> Result<Prediction, PredictionError> {
        let max_retries = self.config.rate_limit_retries;
        let mut attempt = 0;

        loop {
            match self
                .transport
                .create(&request.endpoint, &request.input, request.wait_secs)
                .await
            {
                Err(PredictionError::RateLimited) if attempt < max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        backoff_secs = self.config.rate_limit_backoff.as_secs(),
                        "Prediction rate limited, backing off"
                    );
                    tokio::time::sleep(self.config.rate_limit_backoff).await;
                }
                Err(PredictionError::RateLimited) => {
                    tracing::error!(attempts = attempt + 1, "Prediction rate limited, giving up");
                    return Err(PredictionError::RateLimited);
                }
                other => return other,
            }
        }
    }

    fn settle_immediate(prediction: Prediction) -> Result<PredictionOutcome, PredictionError> {
        match prediction.status {
            PredictionStatus::Succeeded => {
                let output = prediction.output.filter(|v| !v.is_null()).ok_or_else(|| {
                    PredictionError::MalformedOutput(format!(
                        "prediction {} succeeded without output",
                        prediction.id
                    ))
                })?;
                Ok(PredictionOutcome::Succeeded(PredictionOutput::new(output)))
            }
            status => Ok(Self::failed(&prediction, status)),
        }
    }

    fn failed(prediction: &Prediction, status: PredictionStatus) -> PredictionOutcome {
        let error = prediction.error_message();
        tracing::warn!(
            prediction_id = %prediction.id,
            status = status.as_str(),
            error = ?error,
            "Prediction did not succeed"
        );
        PredictionOutcome::Failed { status, error }
    }

    async fn poll(
        &self,
        handle: &PollHandle,
        poll_ceiling: u32,
    ) -> Result<PredictionOutcome, PredictionError> {
        tracing::debug!(
            prediction_id = %handle.prediction_id,
            poll_ceiling = poll_ceiling,
            "Prediction pending, polling"
        );

        for _ in 0..poll_ceiling {
            tokio::time::sleep(self.config.poll_interval).await;

            let prediction = self.transport.fetch(&handle.poll_url).await?;
            match prediction.status {
                // 成功但输出尚未写入时继续轮询
                PredictionStatus::Succeeded => {
                    if let Some(output) = prediction.output.filter(|v| !v.is_null()) {
                        return Ok(PredictionOutcome::Succeeded(PredictionOutput::new(output)));
                    }
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    return Ok(Self::failed(&prediction, prediction.status));
                }
                PredictionStatus::Starting | PredictionStatus::Processing => {}
            }
        }

        tracing::warn!(
            prediction_id = %handle.prediction_id,
            polls = poll_ceiling,
            "Prediction polling timed out"
        );
        Ok(PredictionOutcome::TimedOut {
            polls: poll_ceiling,
        })
    }
}
