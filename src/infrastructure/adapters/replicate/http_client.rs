//! Replicate HTTP Client - 调用 Replicate 预测 API
//!
//! 实现 PredictionTransportPort trait，每次调用只做一次 HTTP 往返
//!
//! Replicate API:
//! POST <model>/predictions   Body: {"input": {...}}   Header: Prefer: wait=N
//! GET  <urls.get>
//! Response: {"id", "status", "output", "urls": {"get"}, "error"}

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::application::ports::{Prediction, PredictionError, PredictionTransportPort};

/// 创建预测请求体
#[derive(Debug, Serialize)]
struct CreatePredictionBody<'a> {
    input: &'a Value,
}

/// Replicate 客户端配置
#[derive(Debug, Clone)]
pub struct ReplicateHttpClientConfig {
    /// API 令牌
    pub api_token: String,
    /// 单次 HTTP 请求超时时间（秒），需大于内联等待时间
    pub timeout_secs: u64,
}

impl Default for ReplicateHttpClientConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            timeout_secs: 180,
        }
    }
}

impl ReplicateHttpClientConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Replicate HTTP 客户端
pub struct ReplicateHttpClient {
    client: Client,
    config: ReplicateHttpClientConfig,
}

impl ReplicateHttpClient {
    pub fn new(config: ReplicateHttpClientConfig) -> Result<Self, PredictionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PredictionError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn token(&self) -> Result<&str, PredictionError> {
        let token = self.config.api_token.trim();
        if token.is_empty() {
            return Err(PredictionError::Configuration(
                "Replicate API token is not configured".to_string(),
            ));
        }
        Ok(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Prediction, PredictionError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                PredictionError::NetworkError(format!("Request to Replicate timed out: {}", e))
            } else if e.is_connect() {
                PredictionError::NetworkError(format!("Cannot connect to Replicate: {}", e))
            } else {
                PredictionError::NetworkError(e.to_string())
            }
        })?;

        Self::decode(response).await
    }

    async fn decode(response: Response) -> Result<Prediction, PredictionError> {
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(PredictionError::RateLimited);
        }

        if status.as_u16() == 401 {
            return Err(PredictionError::Configuration(
                "Replicate rejected the API token".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PredictionError::UpstreamRejected {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        response
            .json::<Prediction>()
            .await
            .map_err(|e| PredictionError::MalformedOutput(format!("Invalid prediction body: {}", e)))
    }
}

/// 提取上游错误描述（优先 detail，其次 title，否则原文）
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["detail", "title"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl PredictionTransportPort for ReplicateHttpClient {
    async fn create(
        &self,
        endpoint: &str,
        input: &Value,
        wait_secs: u64,
    ) -> Result<Prediction, PredictionError> {
        let token = self.token()?;

        tracing::debug!(endpoint = %endpoint, wait_secs = wait_secs, "Creating prediction");

        let request = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .header("Prefer", format!("wait={}", wait_secs))
            .json(&CreatePredictionBody { input });

        let prediction = self.send(request).await?;

        tracing::debug!(
            prediction_id = %prediction.id,
            status = prediction.status.as_str(),
            "Prediction created"
        );

        Ok(prediction)
    }

    async fn fetch(&self, poll_url: &str) -> Result<Prediction, PredictionError> {
        let token = self.token()?;
        let request = self.client.get(poll_url).bearer_auth(token);
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::PredictionStatus;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// 上游收到的请求: (Authorization, Prefer, body)
    type Seen = Arc<Mutex<Vec<(Option<String>, Option<String>, Value)>>>;

    fn header(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn accept(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        seen.lock().unwrap().push((
            header(&headers, "authorization"),
            header(&headers, "prefer"),
            body,
        ));
        Json(json!({
            "id": "p1",
            "status": "processing",
            "urls": { "get": "http://upstream.invalid/predictions/p1" }
        }))
    }

    async fn reject(Path(code): Path<u16>) -> (StatusCode, Json<Value>) {
        (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "title": "Rejected", "detail": format!("upstream said {}", code) })),
        )
    }

    async fn garbage() -> &'static str {
        "<html>not a prediction</html>"
    }

    async fn poll(headers: HeaderMap) -> (StatusCode, Json<Value>) {
        if header(&headers, "authorization").as_deref() != Some("Bearer r8_test") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "no token" })));
        }
        (
            StatusCode::OK,
            Json(json!({ "id": "p1", "status": "succeeded", "output": "https://img.example/a.png" })),
        )
    }

    /// 在随机端口启动模拟上游，返回 base URL
    async fn upstream(seen: Seen) -> String {
        let router = Router::new()
            .route("/accept", post(accept))
            .route("/status/:code", post(reject))
            .route("/garbage", post(garbage))
            .route("/predictions/p1", get(poll))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client() -> ReplicateHttpClient {
        ReplicateHttpClient::new(ReplicateHttpClientConfig::new("r8_test").with_timeout(5)).unwrap()
    }

    #[test]
    fn test_config_builder() {
        let config = ReplicateHttpClientConfig::new("r8_token").with_timeout(30);
        assert_eq!(config.api_token, "r8_token");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_error_detail_prefers_detail_field() {
        let body = r#"{"title":"Payment Required","detail":"You have insufficient credit"}"#;
        assert_eq!(error_detail(body), "You have insufficient credit");
    }

    #[test]
    fn test_error_detail_falls_back_to_title_then_body() {
        assert_eq!(error_detail(r#"{"title":"Bad Request"}"#), "Bad Request");
        assert_eq!(error_detail("  gateway down "), "gateway down");
    }

    #[tokio::test]
    async fn test_blank_token_is_configuration_error() {
        let client = ReplicateHttpClient::new(ReplicateHttpClientConfig::new("  ")).unwrap();

        let result = client
            .create("http://127.0.0.1:9/predictions", &json!({}), 60)
            .await;
        assert!(matches!(result, Err(PredictionError::Configuration(_))));

        let result = client.fetch("http://127.0.0.1:9/predictions/p1").await;
        assert!(matches!(result, Err(PredictionError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_create_sends_wait_hint_bearer_and_input_envelope() {
        let seen = Seen::default();
        let base = upstream(seen.clone()).await;

        let prediction = client()
            .create(&format!("{}/accept", base), &json!({ "prompt": "a castle" }), 60)
            .await
            .unwrap();

        assert_eq!(prediction.id, "p1");
        assert_eq!(prediction.status, PredictionStatus::Processing);
        assert_eq!(
            prediction.poll_url(),
            Some("http://upstream.invalid/predictions/p1")
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, prefer, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer r8_test"));
        assert_eq!(prefer.as_deref(), Some("wait=60"));
        assert_eq!(body, &json!({ "input": { "prompt": "a castle" } }));
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer() {
        let base = upstream(Seen::default()).await;

        let prediction = client()
            .fetch(&format!("{}/predictions/p1", base))
            .await
            .unwrap();

        assert_eq!(prediction.status, PredictionStatus::Succeeded);
        assert_eq!(prediction.output, Some(json!("https://img.example/a.png")));
    }

    async fn create_at(
        client: &ReplicateHttpClient,
        base: &str,
        code: u16,
    ) -> Result<Prediction, PredictionError> {
        client
            .create(&format!("{}/status/{}", base, code), &json!({}), 1)
            .await
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let base = upstream(Seen::default()).await;
        let replicate = client();
        let create = |code: u16| create_at(&replicate, &base, code);

        assert!(matches!(create(429).await, Err(PredictionError::RateLimited)));
        assert!(matches!(create(401).await, Err(PredictionError::Configuration(_))));

        let err = create(402).await.unwrap_err();
        assert!(err.is_insufficient_credit());
        match err {
            PredictionError::UpstreamRejected { status, detail } => {
                assert_eq!(status, 402);
                assert_eq!(detail, "upstream said 402");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        for code in [400u16, 422, 500, 503] {
            match create(code).await {
                Err(PredictionError::UpstreamRejected { status, .. }) => assert_eq!(status, code),
                other => panic!("HTTP {}: unexpected result {:?}", code, other),
            }
        }
    }

    #[tokio::test]
    async fn test_success_with_invalid_body_is_malformed() {
        let base = upstream(Seen::default()).await;

        let result = client()
            .create(&format!("{}/garbage", base), &json!({}), 1)
            .await;

        assert!(matches!(result, Err(PredictionError::MalformedOutput(_))));
    }
}
