//! Endpoint Vitals - HTTP/HTTPS/TCP 端点存活检测工具
//!
//! 读取端点列表，并发探测每个端点并与期望结果比较，支持：
//! - HTTP/HTTPS 状态码检测（HEAD 请求）
//! - TCP 连接检测
//! - 文本、表格、JSON 输出
//! - 按请求执行检测的 Web 页面
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod report;
pub mod web;

// 重新导出主要类型
pub use config::{Config, EndpointDescriptor, GlobalConfig};
pub use error::{ConfigError, VitalsError};
pub use health::{
    normalize_all, CheckResult, ConcurrentRunner, EndpointSpec, Expectation, Observation, Scheme,
};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
