//! 检测结果数据结构
//!
//! 定义探测观测值、单个端点的检测结果以及一轮检测的汇总统计

use crate::health::spec::{EndpointSpec, Expectation, Scheme};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// 探测观测值
///
/// 成功值为状态码或 `Connected`，其余三种是失败标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Observation {
    /// HTTP 状态码
    Status(u16),
    /// TCP 连接成功
    Connected,
    /// 连接或读取超时
    Timeout,
    /// 协议层错误（连接被拒绝、重置、响应格式错误等）
    ProtocolError,
    /// TCP 目标不可达，或主机名无法解析
    Unreachable,
}

impl Observation {
    /// 是否为失败标记
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Observation::Timeout | Observation::ProtocolError | Observation::Unreachable
        )
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Status(code) => write!(f, "{code}"),
            Observation::Connected => f.write_str("Connected"),
            Observation::Timeout => f.write_str("Timeout"),
            Observation::ProtocolError => f.write_str("ProtocolError"),
            Observation::Unreachable => f.write_str("Unreachable"),
        }
    }
}

/// 状态码序列化为数字，其余序列化为标记名
impl Serialize for Observation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Observation::Status(code) => serializer.serialize_u16(*code),
            other => serializer.collect_str(other),
        }
    }
}

/// 单个端点的检测结果
///
/// 由检测执行器一次性创建，之后只读。
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    name: String,
    url: String,
    scheme: Scheme,
    #[serde(rename = "status")]
    observed: Observation,
    expected: Expectation,
    #[serde(rename = "response_time", with = "seconds_serde")]
    elapsed: Duration,
    #[serde(rename = "ok")]
    healthy: bool,
    checked_at: DateTime<Utc>,
}

impl CheckResult {
    /// 创建检测结果，健康判定为观测值与期望值精确相等
    pub fn new(spec: &EndpointSpec, observed: Observation, elapsed: Duration) -> Self {
        Self {
            name: spec.name.clone(),
            url: spec.url.clone(),
            scheme: spec.scheme,
            observed,
            expected: spec.expected,
            elapsed,
            healthy: spec.expected.matches(&observed),
            checked_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn observed(&self) -> Observation {
        self.observed
    }

    pub fn expected(&self) -> Expectation {
        self.expected
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// 获取响应时间（毫秒）
    pub fn response_time_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// `OK` / `NO` 形式的判定
    pub fn verdict(&self) -> &'static str {
        if self.healthy {
            "OK"
        } else {
            "NO"
        }
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Duration 以浮点秒序列化
mod seconds_serde {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// 一轮检测的汇总统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// 端点总数
    pub total: usize,
    /// 健康数
    pub healthy: usize,
    /// 异常数
    pub unhealthy: usize,
    /// 平均响应时间（毫秒）
    pub average_response_time_ms: f64,
    /// 最大响应时间（毫秒）
    pub max_response_time_ms: u64,
    /// 成功率（百分比）
    pub success_rate: f64,
}

impl RunSummary {
    /// 根据结果列表计算汇总
    pub fn from_results(results: &[CheckResult]) -> Self {
        let total = results.len();
        let healthy = results.iter().filter(|r| r.is_healthy()).count();

        let total_ms: u64 = results.iter().map(|r| r.response_time_ms()).sum();
        let max_response_time_ms = results
            .iter()
            .map(|r| r.response_time_ms())
            .max()
            .unwrap_or(0);

        let (average_response_time_ms, success_rate) = if total > 0 {
            (
                total_ms as f64 / total as f64,
                healthy as f64 / total as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            total,
            healthy,
            unhealthy: total - healthy,
            average_response_time_ms,
            max_response_time_ms,
            success_rate,
        }
    }

    /// 是否全部健康
    pub fn all_healthy(&self) -> bool {
        self.unhealthy == 0
    }
}
