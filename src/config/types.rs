//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{builtin_art_styles, ArtStyleCatalog, DEFAULT_ART_STYLE};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// Replicate 上游配置
    #[serde(default)]
    pub replicate: ReplicateConfig,

    /// 生成流程配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Replicate 上游配置
#[derive(Clone, Deserialize)]
pub struct ReplicateConfig {
    /// API 令牌（不会出现在日志中）
    #[serde(default)]
    pub api_token: String,

    /// 文本模型预测端点
    #[serde(default = "default_text_endpoint")]
    pub text_endpoint: String,

    /// 图像模型预测端点
    #[serde(default = "default_image_endpoint")]
    pub image_endpoint: String,

    /// 单次 HTTP 请求超时时间（秒）
    #[serde(default = "default_replicate_timeout")]
    pub timeout_secs: u64,
}

fn default_text_endpoint() -> String {
    "https://api.replicate.com/v1/models/meta/meta-llama-3.1-405b-instruct/predictions".to_string()
}

fn default_image_endpoint() -> String {
    "https://api.replicate.com/v1/models/black-forest-labs/flux-kontext-pro/predictions"
        .to_string()
}

fn default_replicate_timeout() -> u64 {
    180
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            text_endpoint: default_text_endpoint(),
            image_endpoint: default_image_endpoint(),
            timeout_secs: default_replicate_timeout(),
        }
    }
}

impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_token", &if self.api_token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("text_endpoint", &self.text_endpoint)
            .field("image_endpoint", &self.image_endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 生成流程配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 文本生成内联等待（秒）
    #[serde(default = "default_text_wait")]
    pub text_wait_secs: u64,

    /// 文本生成轮询上限
    #[serde(default = "default_text_poll_ceiling")]
    pub text_poll_ceiling: u32,

    /// 插图内联等待（秒）
    #[serde(default = "default_image_wait")]
    pub image_wait_secs: u64,

    /// 插图轮询上限
    #[serde(default = "default_image_poll_ceiling")]
    pub image_poll_ceiling: u32,

    /// 轮询间隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// 429 重试次数
    #[serde(default = "default_rate_limit_retries")]
    pub rate_limit_retries: u32,

    /// 429 重试间隔（秒）
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff_secs: u64,

    /// 相邻两次插图调用的间隔（秒）
    #[serde(default = "default_inter_call_delay")]
    pub inter_call_delay_secs: u64,

    /// generating 状态超过该时长视为中断（秒）
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,

    /// 没有角色照片时的参考照片
    #[serde(default = "default_fallback_photo_url")]
    pub fallback_photo_url: String,

    /// 默认画风
    #[serde(default = "default_art_style")]
    pub default_art_style: String,

    /// 追加或覆盖内置画风（画风标识 → 描述）
    #[serde(default)]
    pub art_styles: HashMap<String, String>,
}

fn default_text_wait() -> u64 {
    120
}

fn default_text_poll_ceiling() -> u32 {
    120
}

fn default_image_wait() -> u64 {
    60
}

fn default_image_poll_ceiling() -> u32 {
    60
}

fn default_poll_interval() -> u64 {
    2
}

fn default_rate_limit_retries() -> u32 {
    3
}

fn default_rate_limit_backoff() -> u64 {
    5
}

fn default_inter_call_delay() -> u64 {
    12
}

fn default_stale_after() -> u64 {
    360 // 超过 5 分钟的请求时限
}

fn default_fallback_photo_url() -> String {
    "https://images.unsplash.com/photo-1503454537195-1dcabb73ffb9?w=600&h=800&fit=crop".to_string()
}

fn default_art_style() -> String {
    DEFAULT_ART_STYLE.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text_wait_secs: default_text_wait(),
            text_poll_ceiling: default_text_poll_ceiling(),
            image_wait_secs: default_image_wait(),
            image_poll_ceiling: default_image_poll_ceiling(),
            poll_interval_secs: default_poll_interval(),
            rate_limit_retries: default_rate_limit_retries(),
            rate_limit_backoff_secs: default_rate_limit_backoff(),
            inter_call_delay_secs: default_inter_call_delay(),
            stale_after_secs: default_stale_after(),
            fallback_photo_url: default_fallback_photo_url(),
            default_art_style: default_art_style(),
            art_styles: HashMap::new(),
        }
    }
}

impl GenerationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }

    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_secs(self.inter_call_delay_secs)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_secs as i64)
    }

    /// 内置画风 + 配置中的画风
    pub fn art_style_catalog(&self) -> ArtStyleCatalog {
        let mut styles = builtin_art_styles();
        styles.extend(self.art_styles.clone());
        ArtStyleCatalog::new(styles, self.default_art_style.clone())
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/storybook.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
