//! 协议探测器实现
//!
//! 每种协议一个探测器：HTTP/HTTPS 发送只取响应头的 HEAD 请求，
//! TCP 只做一次连接后立即关闭。所有底层错误都在这里映射为
//! [`Observation`] 中的失败标记，不会向上传播。

use crate::error::{Result, VitalsError};
use crate::health::result::Observation;
use crate::health::spec::{EndpointSpec, Scheme};
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

/// 探测器trait，定义单次探测接口
#[async_trait]
pub trait Probe: Send + Sync {
    /// 执行一次探测
    ///
    /// # 参数
    /// * `spec` - 规范化后的端点
    /// * `timeout_duration` - 本次探测的超时时间
    ///
    /// # 返回
    /// * `Observation` - 观测值或失败标记，不会失败
    async fn probe(&self, spec: &EndpointSpec, timeout_duration: Duration) -> Observation;
}

/// HTTP/HTTPS 探测器
pub struct HttpProbe {
    /// HTTP客户端
    client: Client,
}

impl HttpProbe {
    /// 创建新的HTTP探测器
    ///
    /// 客户端不保留空闲连接，每次探测都使用并释放自己的连接；
    /// 重定向不跟随，报告的是目标返回的原始状态码。
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| VitalsError::Other(anyhow::anyhow!("创建HTTP客户端失败: {e}")))?;

        Ok(Self { client })
    }

    /// 执行探测，不含超时控制
    async fn perform_request(&self, spec: &EndpointSpec) -> Observation {
        // 先解析主机名，解析失败说明目标不可达而不是协议错误
        match lookup_host((spec.host.as_str(), spec.port)).await {
            Ok(mut addrs) => {
                if addrs.next().is_none() {
                    debug!("主机名没有解析结果: {}", spec.host);
                    return Observation::Unreachable;
                }
            }
            Err(e) => {
                debug!("主机名解析失败 {}: {}", spec.host, e);
                return Observation::Unreachable;
            }
        }

        match self.client.head(spec.request_url()).send().await {
            Ok(response) => Observation::Status(response.status().as_u16()),
            Err(e) if e.is_timeout() => Observation::Timeout,
            Err(e) => {
                debug!("HTTP探测失败 {}: {}", spec.name, e);
                Observation::ProtocolError
            }
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, spec: &EndpointSpec, timeout_duration: Duration) -> Observation {
        match timeout(timeout_duration, self.perform_request(spec)).await {
            Ok(observation) => observation,
            Err(_) => {
                debug!("HTTP探测超时: {} ({:?})", spec.name, timeout_duration);
                Observation::Timeout
            }
        }
    }
}

/// TCP 探测器
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, spec: &EndpointSpec, timeout_duration: Duration) -> Observation {
        let connect = TcpStream::connect((spec.host.as_str(), spec.port));

        // 超时时连接 future 被丢弃，未完成的套接字随之关闭
        match timeout(timeout_duration, connect).await {
            Ok(Ok(mut stream)) => {
                if let Err(e) = stream.shutdown().await {
                    debug!("关闭TCP连接失败 {}: {}", spec.name, e);
                }
                Observation::Connected
            }
            Ok(Err(e)) => {
                debug!("TCP连接失败 {}: {}", spec.name, e);
                Observation::Unreachable
            }
            Err(_) => {
                debug!("TCP连接超时: {} ({:?})", spec.name, timeout_duration);
                Observation::Unreachable
            }
        }
    }
}

/// 按协议注册的探测器集合
#[derive(Clone, Default)]
pub struct ProbeSet {
    probes: HashMap<Scheme, Arc<dyn Probe>>,
}

impl ProbeSet {
    /// 创建空集合
    pub fn empty() -> Self {
        Self::default()
    }

    /// 内置探测器：HTTP 与 HTTPS 共用一个 [`HttpProbe`]
    pub fn standard() -> Result<Self> {
        let http: Arc<dyn Probe> = Arc::new(HttpProbe::new()?);
        Ok(Self::empty()
            .with_probe(Scheme::Http, Arc::clone(&http))
            .with_probe(Scheme::Https, http)
            .with_probe(Scheme::Tcp, Arc::new(TcpProbe)))
    }

    /// 注册（或替换）某个协议的探测器
    pub fn with_probe(mut self, scheme: Scheme, probe: Arc<dyn Probe>) -> Self {
        self.probes.insert(scheme, probe);
        self
    }

    /// 获取协议对应的探测器
    pub fn get(&self, scheme: Scheme) -> Option<&Arc<dyn Probe>> {
        self.probes.get(&scheme)
    }

    /// 已注册的协议
    pub fn schemes(&self) -> Vec<Scheme> {
        Scheme::ALL
            .into_iter()
            .filter(|s| self.probes.contains_key(s))
            .collect()
    }
}

impl std::fmt::Debug for ProbeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeSet")
            .field("schemes", &self.schemes())
            .finish()
    }
}
