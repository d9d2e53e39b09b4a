//! Scripted Prediction Transport - 用于测试的预测传输
//!
//! 按脚本顺序返回预设响应，不发起网络请求，并记录所有调用

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::application::ports::{
    Prediction, PredictionError, PredictionStatus, PredictionTransportPort, PredictionUrls,
};

/// 记录的创建调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCreate {
    pub endpoint: String,
    pub input: Value,
    pub wait_secs: u64,
}

type Scripted = Result<Prediction, PredictionError>;

/// Scripted Prediction Transport
///
/// 脚本耗尽后返回 NetworkError
#[derive(Default)]
pub struct ScriptedPredictionTransport {
    creates: Mutex<VecDeque<Scripted>>,
    fetches: Mutex<VecDeque<Scripted>>,
    created: Mutex<Vec<RecordedCreate>>,
    fetched: Mutex<Vec<String>>,
}

impl ScriptedPredictionTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_create(&self, prediction: Prediction) {
        self.creates.lock().await.push_back(Ok(prediction));
    }

    pub async fn push_create_error(&self, error: PredictionError) {
        self.creates.lock().await.push_back(Err(error));
    }

    pub async fn push_fetch(&self, prediction: Prediction) {
        self.fetches.lock().await.push_back(Ok(prediction));
    }

    pub async fn push_fetch_error(&self, error: PredictionError) {
        self.fetches.lock().await.push_back(Err(error));
    }

    /// 所有创建调用
    pub async fn created(&self) -> Vec<RecordedCreate> {
        self.created.lock().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetched.lock().await.len()
    }

    /// 已完成的预测
    pub fn succeeded(output: Value) -> Prediction {
        Prediction {
            id: "scripted".to_string(),
            status: PredictionStatus::Succeeded,
            output: Some(output),
            urls: None,
            error: None,
        }
    }

    /// 执行中的预测，带轮询地址
    pub fn processing(id: &str) -> Prediction {
        Prediction {
            id: id.to_string(),
            status: PredictionStatus::Processing,
            output: None,
            urls: Some(PredictionUrls {
                get: Some(format!("https://scripted.invalid/predictions/{}", id)),
            }),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Prediction {
        Prediction {
            id: "scripted".to_string(),
            status: PredictionStatus::Failed,
            output: None,
            urls: None,
            error: Some(Value::String(error.to_string())),
        }
    }

    pub fn canceled() -> Prediction {
        Prediction {
            id: "scripted".to_string(),
            status: PredictionStatus::Canceled,
            output: None,
            urls: None,
            error: None,
        }
    }
}

#[async_trait]
impl PredictionTransportPort for ScriptedPredictionTransport {
    async fn create(
        &self,
        endpoint: &str,
        input: &Value,
        wait_secs: u64,
    ) -> Result<Prediction, PredictionError> {
        self.created.lock().await.push(RecordedCreate {
            endpoint: endpoint.to_string(),
            input: input.clone(),
            wait_secs,
        });
        self.creates.lock().await.pop_front().unwrap_or_else(|| {
            Err(PredictionError::NetworkError(
                "scripted create responses exhausted".to_string(),
            ))
        })
    }

    async fn fetch(&self, poll_url: &str) -> Result<Prediction, PredictionError> {
        self.fetched.lock().await.push(poll_url.to_string());
        self.fetches.lock().await.pop_front().unwrap_or_else(|| {
            Err(PredictionError::NetworkError(
                "scripted fetch responses exhausted".to_string(),
            ))
        })
    }
}
