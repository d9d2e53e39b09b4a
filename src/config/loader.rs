//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `STORYBOOK_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `STORYBOOK_SERVER__PORT=8080`
/// - `STORYBOOK_REPLICATE__API_TOKEN=r8_...`
/// - `STORYBOOK_GENERATION__INTER_CALL_DELAY_SECS=12`
/// - `STORYBOOK_DATABASE__PATH=/data/storybook.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("replicate.api_token", "")?
        .set_default("replicate.timeout_secs", 180)?
        .set_default("generation.text_wait_secs", 120)?
        .set_default("generation.text_poll_ceiling", 120)?
        .set_default("generation.image_wait_secs", 60)?
        .set_default("generation.image_poll_ceiling", 60)?
        .set_default("generation.poll_interval_secs", 2)?
        .set_default("generation.rate_limit_retries", 3)?
        .set_default("generation.rate_limit_backoff_secs", 5)?
        .set_default("generation.inter_call_delay_secs", 12)?
        .set_default("generation.stale_after_secs", 360)?
        .set_default("database.path", "data/storybook.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: STORYBOOK_REPLICATE__API_TOKEN=r8_xxx
    builder = builder.add_source(
        Environment::with_prefix("STORYBOOK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }

    // 凭证缺失属于部署缺陷，启动时直接失败
    if config.replicate.api_token.trim().is_empty() {
        return invalid("Replicate API token is not configured (STORYBOOK_REPLICATE__API_TOKEN)");
    }

    if config.replicate.text_endpoint.trim().is_empty()
        || config.replicate.image_endpoint.trim().is_empty()
    {
        return invalid("Replicate endpoints cannot be empty");
    }

    let generation = &config.generation;
    if generation.poll_interval_secs == 0 {
        return invalid("Poll interval cannot be 0");
    }
    if generation.text_poll_ceiling == 0 || generation.image_poll_ceiling == 0 {
        return invalid("Poll ceilings cannot be 0");
    }
    if !generation
        .art_style_catalog()
        .contains(&generation.default_art_style)
    {
        return Err(ConfigError::ValidationError(format!(
            "Unknown default art style: {}",
            generation.default_art_style
        )));
    }

    if config.database.path.is_empty() {
        return invalid("Database path cannot be empty");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志，不含凭证）
pub fn print_config(config: &AppConfig) {
    let generation = &config.generation;
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Text Endpoint: {}", config.replicate.text_endpoint);
    tracing::info!("Image Endpoint: {}", config.replicate.image_endpoint);
    tracing::info!("Upstream Timeout: {}s", config.replicate.timeout_secs);
    tracing::info!(
        "Text: wait {}s, poll ceiling {}",
        generation.text_wait_secs,
        generation.text_poll_ceiling
    );
    tracing::info!(
        "Image: wait {}s, poll ceiling {}",
        generation.image_wait_secs,
        generation.image_poll_ceiling
    );
    tracing::info!(
        "Poll Interval: {}s, Rate Limit: {} retries / {}s",
        generation.poll_interval_secs,
        generation.rate_limit_retries,
        generation.rate_limit_backoff_secs
    );
    tracing::info!("Inter-call Delay: {}s", generation.inter_call_delay_secs);
    tracing::info!("Stale Generation After: {}s", generation.stale_after_secs);
    tracing::info!("Default Art Style: {}", generation.default_art_style);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
