//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Endpoint Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum VitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 多个端点描述同时无效
    #[error("{} 个端点配置无效: {}", .0.len(), join_errors(.0))]
    InvalidEndpoints(Vec<ConfigError>),

    /// 检测完成但存在异常端点
    #[error("{unhealthy}/{total} 个端点检测异常")]
    Unhealthy { unhealthy: usize, total: usize },

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 配置错误类型
///
/// 端点规范化阶段产生的错误都属于这一类，它们对整次运行是致命的。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 不支持的协议
    #[error("端点 {name} 使用了不支持的协议: {scheme}")]
    UnsupportedScheme { name: String, scheme: String },

    /// TCP 端点缺少端口
    #[error("端点 {name} 缺少端口: {url}")]
    MissingPort { name: String, url: String },

    /// URL 中缺少主机
    #[error("端点 {name} 缺少主机: {url}")]
    MissingHost { name: String, url: String },

    /// URL 无法解析
    #[error("端点 {name} 的URL无效 ({url}): {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    /// 期望结果与协议不匹配
    #[error("端点 {name} 的期望结果无效: {reason}")]
    InvalidExpectation { name: String, reason: String },

    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, VitalsError>;
