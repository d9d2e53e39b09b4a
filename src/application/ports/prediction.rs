//! Prediction Transport Port - 上游异步预测协议抽象
//!
//! 上游协议: 创建预测（可要求服务端内联等待 N 秒），若未完成则轮询 `urls.get`。
//! 具体 HTTP 实现在 infrastructure/adapters 层。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// 预测调用错误
#[derive(Debug, Error)]
pub enum PredictionError {
    /// 凭证缺失或无效（部署缺陷，不重试）
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 上游限流（HTTP 429）
    #[error("Rate limited by upstream")]
    RateLimited,

    /// 上游拒绝请求（非 2xx，非 429）
    #[error("Upstream rejected request: HTTP {status}: {detail}")]
    UpstreamRejected { status: u16, detail: String },

    /// 预测成功但输出结构无法识别
    #[error("Malformed prediction output: {0}")]
    MalformedOutput(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl PredictionError {
    /// 上游返回 402，账户额度不足
    pub fn is_insufficient_credit(&self) -> bool {
        matches!(self, PredictionError::UpstreamRejected { status: 402, .. })
    }
}

/// 预测状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

/// 上游返回的预测对象（不持久化）
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    pub fn poll_url(&self) -> Option<&str> {
        self.urls
            .as_ref()
            .and_then(|u| u.get.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// 轮询句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollHandle {
    pub prediction_id: String,
    pub poll_url: String,
}

/// 创建预测后的两种响应形态
#[derive(Debug, Clone)]
pub enum SubmitResponse {
    /// 内联等待期间已到达终态
    Immediate(Prediction),
    /// 仍在执行，需要轮询
    Pending(PollHandle),
}

impl SubmitResponse {
    pub fn classify(prediction: Prediction) -> Result<Self, PredictionError> {
        if prediction.status.is_terminal() {
            return Ok(SubmitResponse::Immediate(prediction));
        }
        let poll_url = prediction.poll_url().ok_or_else(|| {
            PredictionError::MalformedOutput(format!(
                "prediction {} is {} but has no polling URL",
                prediction.id,
                prediction.status.as_str()
            ))
        })?;
        Ok(SubmitResponse::Pending(PollHandle {
            prediction_id: prediction.id.clone(),
            poll_url: poll_url.to_string(),
        }))
    }
}

/// 成功预测的原始输出
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutput(Value);

impl PredictionOutput {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// 提取图片 URL
    ///
    /// 支持: URL 字符串；首元素为 URL 字符串的数组；首元素为带 `url` 字段对象的数组
    pub fn image_url(&self) -> Result<String, PredictionError> {
        let found = match &self.0 {
            Value::String(s) if looks_like_url(s) => Some(s.trim().to_string()),
            Value::Array(items) => match items.first() {
                Some(Value::String(s)) if looks_like_url(s) => Some(s.trim().to_string()),
                Some(Value::Object(obj)) => obj
                    .get("url")
                    .and_then(Value::as_str)
                    .filter(|s| looks_like_url(s))
                    .map(|s| s.trim().to_string()),
                _ => None,
            },
            _ => None,
        };
        found.ok_or_else(|| {
            PredictionError::MalformedOutput(format!(
                "expected an image URL, got {}",
                describe_shape(&self.0)
            ))
        })
    }

    /// 提取文本：字符串，或按顺序无分隔拼接的字符串数组
    pub fn text(&self) -> Result<String, PredictionError> {
        match &self.0 {
            Value::String(s) => Ok(s.clone()),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        PredictionError::MalformedOutput(format!(
                            "expected text fragments, got {}",
                            describe_shape(item)
                        ))
                    })
                })
                .collect::<Result<String, _>>(),
            other => Err(PredictionError::MalformedOutput(format!(
                "expected text output, got {}",
                describe_shape(other)
            ))),
        }
    }
}

fn looks_like_url(s: &str) -> bool {
    s.trim().starts_with("http")
}

fn describe_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 一次预测的终态结果
///
/// 任务失败/取消/轮询超时是确定的"无结果"，不是错误
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Succeeded(PredictionOutput),
    Failed {
        status: PredictionStatus,
        error: Option<String>,
    },
    TimedOut {
        polls: u32,
    },
}

/// Prediction Transport Port
///
/// 单次 HTTP 往返，不包含重试和轮询逻辑
#[async_trait]
pub trait PredictionTransportPort: Send + Sync {
    /// `POST <endpoint>` 创建预测，`wait_secs` 作为内联等待提示
    async fn create(
        &self,
        endpoint: &str,
        input: &Value,
        wait_secs: u64,
    ) -> Result<Prediction, PredictionError>;

    /// `GET <poll_url>` 查询预测状态
    async fn fetch(&self, poll_url: &str) -> Result<Prediction, PredictionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_url_from_string() {
        let output = PredictionOutput::new(json!("https://img.example/a.png"));
        assert_eq!(output.image_url().unwrap(), "https://img.example/a.png");
    }

    #[test]
    fn test_image_url_from_string_list() {
        let output = PredictionOutput::new(json!(["https://img.example/a.png", "https://img.example/b.png"]));
        assert_eq!(output.image_url().unwrap(), "https://img.example/a.png");
    }

    #[test]
    fn test_image_url_from_object_list() {
        let output = PredictionOutput::new(json!([{ "url": "https://img.example/a.png" }]));
        assert_eq!(output.image_url().unwrap(), "https://img.example/a.png");
    }

    #[test]
    fn test_image_url_rejects_unknown_shape() {
        for value in [json!({ "url": "https://x" }), json!(42), json!([]), json!("not a url")] {
            let output = PredictionOutput::new(value);
            assert!(matches!(
                output.image_url(),
                Err(PredictionError::MalformedOutput(_))
            ));
        }
    }

    #[test]
    fn test_text_joins_fragments_without_separator() {
        let output = PredictionOutput::new(json!(["{\"ti", "tle\":", " \"A\"}"]));
        assert_eq!(output.text().unwrap(), "{\"title\": \"A\"}");
    }

    #[test]
    fn test_text_rejects_non_string_fragment() {
        let output = PredictionOutput::new(json!(["a", 1]));
        assert!(output.text().is_err());
    }

    #[test]
    fn test_classify_terminal_is_immediate() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "p1", "status": "succeeded", "output": "https://img.example/a.png"
        }))
        .unwrap();
        assert!(matches!(
            SubmitResponse::classify(prediction),
            Ok(SubmitResponse::Immediate(_))
        ));
    }

    #[test]
    fn test_classify_processing_is_pending() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "p1", "status": "processing", "urls": { "get": "https://api.example/p1" }
        }))
        .unwrap();
        match SubmitResponse::classify(prediction).unwrap() {
            SubmitResponse::Pending(handle) => {
                assert_eq!(handle.poll_url, "https://api.example/p1");
                assert_eq!(handle.prediction_id, "p1");
            }
            other => panic!("expected pending, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_pending_without_poll_url_fails() {
        let prediction: Prediction =
            serde_json::from_value(json!({ "id": "p1", "status": "starting" })).unwrap();
        assert!(SubmitResponse::classify(prediction).is_err());
    }

    #[test]
    fn test_insufficient_credit_detection() {
        let err = PredictionError::UpstreamRejected {
            status: 402,
            detail: "payment required".to_string(),
        };
        assert!(err.is_insufficient_credit());
        assert!(!PredictionError::RateLimited.is_insufficient_credit());
    }
}
