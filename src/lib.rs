//! Storybook - 个性化儿童绘本生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 绘本聚合与状态机
//! - 故事提示词构建与故事结构解析
//!
//! 应用层 (application/):
//! - Ports: 端口定义（PredictionTransport, StoryWriter, Illustrator, BookRepository）
//! - Services: 预测客户端、文本生成、插图生成、批量插图
//! - Commands: 创建绘本、生成协调
//! - Queries: 绘本查询
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API
//! - Adapters: 上游预测服务 HTTP 客户端
//! - Persistence: SQLite 存储
//! - Memory: 内存版 BookRepository（测试用）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
