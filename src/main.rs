//! Storybook - 个性化儿童绘本生成服务

use std::sync::Arc;

use storybook::application::{
    GenerationSettings, IllustrationBatch, IllustrationGenerator, IllustrationGeneratorConfig,
    PredictionClient, PredictionClientConfig, TextGenerator, TextGeneratorConfig,
};
use storybook::config::{load_config, print_config, AppConfig};
use storybook::infrastructure::adapters::{ReplicateHttpClient, ReplicateHttpClientConfig};
use storybook::infrastructure::http::{AppState, HttpServer, ServerConfig};
use storybook::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Storybook - 绘本生成服务");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let book_repo = Arc::new(SqliteBookRepository::new(pool));

    // 上游预测服务
    let transport = Arc::new(ReplicateHttpClient::new(
        ReplicateHttpClientConfig::new(config.replicate.api_token.clone())
            .with_timeout(config.replicate.timeout_secs),
    )?);
    let generation = &config.generation;
    let client = Arc::new(PredictionClient::new(
        transport,
        PredictionClientConfig {
            poll_interval: generation.poll_interval(),
            rate_limit_retries: generation.rate_limit_retries,
            rate_limit_backoff: generation.rate_limit_backoff(),
        },
    ));

    let mut text_config = TextGeneratorConfig::new(config.replicate.text_endpoint.clone());
    text_config.wait_secs = generation.text_wait_secs;
    text_config.poll_ceiling = generation.text_poll_ceiling;
    let story_writer = Arc::new(TextGenerator::new(client.clone(), text_config));

    let mut image_config = IllustrationGeneratorConfig::new(config.replicate.image_endpoint.clone());
    image_config.wait_secs = generation.image_wait_secs;
    image_config.poll_ceiling = generation.image_poll_ceiling;
    let illustrator = Arc::new(IllustrationGenerator::new(client, image_config));
    let batch = Arc::new(IllustrationBatch::new(
        illustrator,
        generation.inter_call_delay(),
    ));

    let settings = GenerationSettings {
        art_styles: generation.art_style_catalog(),
        fallback_photo_url: generation.fallback_photo_url.clone(),
        stale_after: generation.stale_after(),
    };

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(book_repo, story_writer, batch, settings);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},storybook={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
