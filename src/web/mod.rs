//! Web界面模块
//!
//! 每个请求执行一轮检测，以HTML页面或JSON返回结果

use crate::config::types::WebConfig;
use crate::health::CheckResult;
use serde::Serialize;
use std::path::PathBuf;

pub mod handlers;
pub mod server;

pub use server::{create_router, WebServer};

/// Web应用共享状态
#[derive(Debug, Clone)]
pub struct WebAppState {
    /// 配置文件路径，每个请求重新读取
    pub config_path: PathBuf,
    /// Web配置
    pub config: WebConfig,
}

impl WebAppState {
    /// 创建Web应用状态
    pub fn new(config_path: PathBuf, config: WebConfig) -> Self {
        Self {
            config_path,
            config,
        }
    }
}

/// 页面和API使用的端点状态
#[derive(Debug, Clone, Serialize)]
pub struct WebEndpointStatus {
    pub name: String,
    pub url: String,
    pub scheme: String,
    pub status: String,
    pub expected: String,
    pub ok: bool,
    pub response_time_ms: u64,
    pub last_check: String,
}

impl From<&CheckResult> for WebEndpointStatus {
    fn from(result: &CheckResult) -> Self {
        Self {
            name: result.name().to_string(),
            url: result.url().to_string(),
            scheme: result.scheme().to_string(),
            status: result.observed().to_string(),
            expected: result.expected().to_string(),
            ok: result.is_healthy(),
            response_time_ms: result.response_time_ms(),
            last_check: result.checked_at().to_rfc3339(),
        }
    }
}
