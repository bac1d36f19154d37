//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 主配置结构，包含全局配置和端点列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 端点描述列表
    #[serde(default)]
    pub services: Vec<EndpointDescriptor>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 日志级别，命令行未指定级别时生效
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// 单次探测超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// 最大并发检测数，0 表示不限制
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,
    /// 额外的端点列表文件（YAML 或 TOML），相对路径基于配置文件所在目录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_file: Option<PathBuf>,
    /// Web 服务器配置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebConfig>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            request_timeout_seconds: default_timeout(),
            max_concurrent_checks: default_max_concurrent(),
            services_file: None,
            web: None,
        }
    }
}

/// 原始端点描述
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointDescriptor {
    /// 端点名称
    pub name: String,
    /// 端点URL，形如 `scheme://host[:port][/path]`
    pub url: String,
    /// 期望结果，缺省时使用协议默认值
    #[serde(
        default,
        alias = "expected_result",
        alias = "expectedResult",
        skip_serializing_if = "Option::is_none"
    )]
    pub expect_code: Option<ExpectedValue>,
    /// 端点描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 配置中的期望值：状态码或关键字
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExpectedValue {
    /// 数字状态码
    Code(u16),
    /// 关键字，如 `connected`
    Keyword(String),
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::Code(code) => write!(f, "{code}"),
            ExpectedValue::Keyword(text) => write!(f, "{text:?}"),
        }
    }
}

/// Web 服务器配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebConfig {
    /// 监听端口
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 绑定地址
    #[serde(default = "default_web_bind_address")]
    pub bind_address: String,
    /// 是否只显示异常端点
    #[serde(default)]
    pub show_problems_only: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            bind_address: default_web_bind_address(),
            show_problems_only: false,
        }
    }
}

// 默认值函数
fn default_timeout() -> u64 {
    10
}
fn default_max_concurrent() -> usize {
    0
}
fn default_web_port() -> u16 {
    8080
}
fn default_web_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// 配置验证函数
///
/// 只检查全局项与端点列表是否为空，端点本身的合法性由规范化负责。
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.global.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if let Some(ref level) = config.global.log_level {
        if !valid_log_levels.contains(&level.as_str()) {
            return Err(format!(
                "无效的日志级别: {}，支持的级别: {:?}",
                level, valid_log_levels
            ));
        }
    }

    if let Some(ref web_config) = config.global.web {
        if web_config.port == 0 {
            return Err("Web服务器端口不能为0".to_string());
        }
        if web_config.bind_address.trim().is_empty() {
            return Err("Web服务器绑定地址不能为空".to_string());
        }
    }

    if config.services.is_empty() {
        return Err("至少需要配置一个端点".to_string());
    }

    Ok(())
}
