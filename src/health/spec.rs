//! 端点规范化
//!
//! 把配置中的原始端点描述解析为规范的 [`EndpointSpec`]：
//! 解析协议、主机、端口、路径，并补齐各协议的默认值。
//! 这里不做任何网络 I/O。

use crate::config::types::{EndpointDescriptor, ExpectedValue};
use crate::error::{ConfigError, VitalsError};
use crate::health::result::Observation;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// TCP 端点期望值的关键字
pub const CONNECTED_KEYWORD: &str = "connected";

/// 支持的探测协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    Tcp,
}

impl Scheme {
    /// 全部协议
    pub const ALL: [Scheme; 3] = [Scheme::Http, Scheme::Https, Scheme::Tcp];

    /// 从URL协议名解析（大小写不敏感）
    pub fn parse(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "tcp" => Some(Scheme::Tcp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Tcp => "tcp",
        }
    }

    /// 协议默认端口，TCP 没有默认端口
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Scheme::Http => Some(80),
            Scheme::Https => Some(443),
            Scheme::Tcp => None,
        }
    }

    /// 协议默认的健康判定值
    pub fn default_expectation(&self) -> Expectation {
        match self {
            Scheme::Http | Scheme::Https => Expectation::Status(200),
            Scheme::Tcp => Expectation::Connected,
        }
    }

    /// 是否为 HTTP 系协议
    pub fn is_http(&self) -> bool {
        matches!(self, Scheme::Http | Scheme::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 被视为“健康”的观测结果
///
/// 只有成功类的观测值可以作为期望值，失败标记永远不会与之相等。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// HTTP 状态码
    Status(u16),
    /// TCP 连接成功
    Connected,
}

impl Expectation {
    /// 精确匹配，不做区间或类别比较
    pub fn matches(&self, observed: &Observation) -> bool {
        match (self, observed) {
            (Expectation::Status(expected), Observation::Status(actual)) => expected == actual,
            (Expectation::Connected, Observation::Connected) => true,
            _ => false,
        }
    }

    /// 按协议解析配置中的期望值
    fn resolve(
        name: &str,
        scheme: Scheme,
        value: &ExpectedValue,
    ) -> std::result::Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidExpectation {
            name: name.to_string(),
            reason,
        };

        if scheme.is_http() {
            let code = match value {
                ExpectedValue::Code(code) => *code,
                ExpectedValue::Keyword(text) => text.trim().parse::<u16>().map_err(|_| {
                    invalid(format!("{scheme} 端点的期望值必须是状态码，实际为 {text:?}"))
                })?,
            };
            if !(100..=599).contains(&code) {
                return Err(invalid(format!("状态码 {code} 不在 100-599 范围内")));
            }
            Ok(Expectation::Status(code))
        } else {
            match value {
                ExpectedValue::Keyword(text) if text.trim().eq_ignore_ascii_case(CONNECTED_KEYWORD) => {
                    Ok(Expectation::Connected)
                }
                other => Err(invalid(format!(
                    "tcp 端点的期望值只能是 \"{CONNECTED_KEYWORD}\"，实际为 {other}"
                ))),
            }
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Status(code) => write!(f, "{code}"),
            Expectation::Connected => f.write_str("Connected"),
        }
    }
}

/// 规范化后的端点，创建后只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSpec {
    /// 端点名称
    pub name: String,
    /// 原始URL
    pub url: String,
    /// 协议
    pub scheme: Scheme,
    /// 主机（IPv6 地址不含方括号）
    pub host: String,
    /// 端口
    pub port: u16,
    /// 请求路径，仅 HTTP/HTTPS 有值
    pub path: Option<String>,
    /// 期望结果
    pub expected: Expectation,
}

impl EndpointSpec {
    /// 规范化单个端点描述
    ///
    /// 纯函数：同一描述多次规范化得到相同结果。
    pub fn from_descriptor(
        descriptor: &EndpointDescriptor,
    ) -> std::result::Result<Self, ConfigError> {
        let name = descriptor.name.trim();
        if name.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "端点名称不能为空: {}",
                descriptor.url
            )));
        }

        let raw_url = descriptor.url.trim();
        let url = Url::parse(raw_url).map_err(|e| ConfigError::InvalidUrl {
            name: name.to_string(),
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = Scheme::parse(url.scheme()).ok_or_else(|| ConfigError::UnsupportedScheme {
            name: name.to_string(),
            scheme: url.scheme().to_string(),
        })?;

        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::MissingHost {
                name: name.to_string(),
                url: raw_url.to_string(),
            })?
            .to_string();

        // Url 会省略与协议默认值相同的端口，因此先取显式端口再回退
        let port = url
            .port()
            .or_else(|| scheme.default_port())
            .ok_or_else(|| ConfigError::MissingPort {
                name: name.to_string(),
                url: raw_url.to_string(),
            })?;

        let path = if scheme.is_http() {
            let path = match url.path() {
                "" => "/",
                p => p,
            };
            Some(match url.query() {
                Some(query) => format!("{path}?{query}"),
                None => path.to_string(),
            })
        } else {
            None
        };

        let expected = match &descriptor.expect_code {
            Some(value) => Expectation::resolve(name, scheme, value)?,
            None => scheme.default_expectation(),
        };

        Ok(Self {
            name: name.to_string(),
            url: raw_url.to_string(),
            scheme,
            host,
            port,
            path,
            expected,
        })
    }

    /// `host:port` 形式的地址，IPv6 主机加方括号
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// HTTP/HTTPS 探测使用的完整请求URL
    pub fn request_url(&self) -> String {
        format!(
            "{}://{}{}",
            self.scheme,
            self.authority(),
            self.path.as_deref().unwrap_or("/")
        )
    }
}

/// 规范化全部端点描述
///
/// 任何一个描述无效都会使整次运行失败，错误会全部收集后一起返回。
pub fn normalize_all(
    descriptors: &[EndpointDescriptor],
) -> std::result::Result<Vec<EndpointSpec>, VitalsError> {
    let mut specs = Vec::with_capacity(descriptors.len());
    let mut errors = Vec::new();

    for descriptor in descriptors {
        match EndpointSpec::from_descriptor(descriptor) {
            Ok(spec) => specs.push(spec),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(specs)
    } else {
        Err(VitalsError::InvalidEndpoints(errors))
    }
}
