//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/books/create      POST  创建草稿绘本
//! - /api/books/get         POST  获取绘本详情
//! - /api/generate          POST  生成故事文本与插图（同步，耗时数分钟）
//! - /api/generate-images   POST  只补齐缺失的插图
//!
//! 除 ping 外均要求 `X-User-Id` 请求头

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/books", book_routes())
        .route("/generate", post(handlers::generate_book))
        .route("/generate-images", post(handlers::generate_images))
}

/// Book 路由
fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_book))
        .route("/get", post(handlers::get_book))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        GenerationSettings, IllustrationBatch, IllustrationGenerator,
        IllustrationGeneratorConfig, PredictionClient, PredictionClientConfig, PredictionError,
        TextGenerator, TextGeneratorConfig,
    };
    use crate::infrastructure::adapters::ScriptedPredictionTransport;
    use crate::infrastructure::http::error::errno;
    use crate::infrastructure::memory::InMemoryBookRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        router: Router,
        transport: Arc<ScriptedPredictionTransport>,
        user: Uuid,
    }

    impl TestApp {
        fn new() -> Self {
            let transport = Arc::new(ScriptedPredictionTransport::new());
            let client = Arc::new(PredictionClient::new(
                transport.clone(),
                PredictionClientConfig::default(),
            ));
            let writer = Arc::new(TextGenerator::new(
                client.clone(),
                TextGeneratorConfig::new("https://api.example/text"),
            ));
            let illustrator = Arc::new(IllustrationGenerator::new(
                client,
                IllustrationGeneratorConfig::new("https://api.example/image"),
            ));
            let state = AppState::new(
                Arc::new(InMemoryBookRepository::new()),
                writer,
                Arc::new(IllustrationBatch::new(illustrator, Duration::ZERO)),
                GenerationSettings::default(),
            );

            Self {
                router: create_routes().with_state(Arc::new(state)),
                transport,
                user: Uuid::new_v4(),
            }
        }

        async fn post(&self, uri: &str, user: Option<Uuid>, body: Value) -> Value {
            let mut builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json");
            if let Some(user) = user {
                builder = builder.header("x-user-id", user.to_string());
            }
            let request = builder.body(Body::from(body.to_string())).unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }

        async fn create_book(&self) -> String {
            let body = self
                .post(
                    "/api/books/create",
                    Some(self.user),
                    json!({
                        "character_name": "Mia",
                        "character_age": 6,
                        "story_prompt": "Mia visits the moon",
                        "included_elements": ["a red kite"],
                        "art_style": "watercolor"
                    }),
                )
                .await;
            assert_eq!(body["errno"], 0);
            body["data"]["id"].as_str().unwrap().to_string()
        }
    }

    fn story(pages: usize) -> String {
        let pages = (1..=pages)
            .map(|i| format!(r#"{{"text":"Page {i}.","imagePrompt":"scene {i}"}}"#))
            .collect::<Vec<_>>()
            .join(",");
        format!(r#"{{"title":"Mia and the Moon","pages":[{}]}}"#, pages)
    }

    #[tokio::test]
    async fn test_ping() {
        let app = TestApp::new();
        let request = Request::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_then_get_book() {
        let app = TestApp::new();
        let id = app.create_book().await;

        let body = app
            .post("/api/books/get", Some(app.user), json!({ "id": id }))
            .await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["character_name"], "Mia");
        assert_eq!(body["data"]["pages"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = TestApp::new();

        let body = app
            .post(
                "/api/books/create",
                None,
                json!({ "character_name": "Mia", "story_prompt": "moon" }),
            )
            .await;

        assert_eq!(body["errno"], errno::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_other_users_book_is_not_found() {
        let app = TestApp::new();
        let id = app.create_book().await;

        let body = app
            .post("/api/books/get", Some(Uuid::new_v4()), json!({ "id": id }))
            .await;
        assert_eq!(body["errno"], errno::NOT_FOUND);

        let body = app
            .post("/api/generate", Some(Uuid::new_v4()), json!({ "book_id": id }))
            .await;
        assert_eq!(body["errno"], errno::NOT_FOUND);
        assert!(app.transport.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_story_prompt_is_bad_request() {
        let app = TestApp::new();

        let body = app
            .post(
                "/api/books/create",
                Some(app.user),
                json!({ "character_name": "Mia", "story_prompt": "   " }),
            )
            .await;

        assert_eq!(body["errno"], errno::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_book_ready_with_partial_failure_note() {
        let app = TestApp::new();
        let id = app.create_book().await;
        app.transport
            .push_create(ScriptedPredictionTransport::succeeded(json!(story(2))))
            .await;
        app.transport
            .push_create(ScriptedPredictionTransport::succeeded(json!("https://img.example/1.png")))
            .await;
        app.transport
            .push_create(ScriptedPredictionTransport::failed("NSFW content detected"))
            .await;

        let body = app
            .post("/api/generate", Some(app.user), json!({ "book_id": id }))
            .await;

        assert_eq!(body["errno"], 0);
        let data = &body["data"];
        assert_eq!(data["status"], "ready");
        assert_eq!(data["summary"]["succeeded"], 1);
        assert_eq!(data["summary"]["failed_pages"], json!([2]));
        assert!(data["note"].as_str().unwrap().contains("1 of 2"));
        assert_eq!(data["book"]["title"], "Mia and the Moon");
        assert_eq!(data["book"]["cover_image_url"], "https://img.example/1.png");
    }

    #[tokio::test]
    async fn test_generate_insufficient_credit() {
        let app = TestApp::new();
        let id = app.create_book().await;
        app.transport
            .push_create_error(PredictionError::UpstreamRejected {
                status: 402,
                detail: "Insufficient credit".to_string(),
            })
            .await;

        let body = app
            .post("/api/generate", Some(app.user), json!({ "book_id": id }))
            .await;
        assert_eq!(body["errno"], errno::PAYMENT_REQUIRED);

        let body = app
            .post("/api/books/get", Some(app.user), json!({ "id": id }))
            .await;
        assert_eq!(body["data"]["status"], "failed");
        assert_eq!(body["data"]["failure_reason"], "insufficient_credit");
    }

    #[tokio::test]
    async fn test_generate_images_requires_pages() {
        let app = TestApp::new();
        let id = app.create_book().await;

        let body = app
            .post("/api/generate-images", Some(app.user), json!({ "book_id": id }))
            .await;

        assert_eq!(body["errno"], errno::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Generate the story first"));
    }

    #[tokio::test]
    async fn test_generate_images_all_failed_is_bad_gateway() {
        let app = TestApp::new();
        let id = app.create_book().await;
        app.transport
            .push_create(ScriptedPredictionTransport::succeeded(json!(story(1))))
            .await;
        app.transport
            .push_create(ScriptedPredictionTransport::failed("boom"))
            .await;

        let body = app
            .post("/api/generate", Some(app.user), json!({ "book_id": id }))
            .await;
        assert_eq!(body["errno"], errno::BAD_GATEWAY);

        app.transport
            .push_create(ScriptedPredictionTransport::succeeded(json!("https://img.example/1.png")))
            .await;
        let body = app
            .post("/api/generate-images", Some(app.user), json!({ "book_id": id }))
            .await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["status"], "ready");
        assert_eq!(
            body["data"]["book"]["pages"][0]["image_url"],
            "https://img.example/1.png"
        );
    }
}
