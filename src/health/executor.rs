//! 检测执行器
//!
//! 对单个端点执行一次探测并计时，组装 [`CheckResult`]。
//! 执行器本身不做并发，并发由 [`crate::health::runner`] 负责。

use crate::health::probe::ProbeSet;
use crate::health::result::{CheckResult, Observation};
use crate::health::spec::EndpointSpec;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{error, trace, warn};

/// 单端点检测执行器
#[derive(Debug, Clone)]
pub struct CheckExecutor {
    /// 按协议分发的探测器
    probes: ProbeSet,
    /// 每次探测的超时时间
    probe_timeout: Duration,
}

impl CheckExecutor {
    /// 创建执行器
    pub fn new(probes: ProbeSet, probe_timeout: Duration) -> Self {
        Self {
            probes,
            probe_timeout,
        }
    }

    /// 检测一个端点
    ///
    /// 计时从调用探测器之前开始，到探测器返回之后结束，失败路径同样计时。
    /// 探测器内部的 panic 在这里被捕获并记为 `ProtocolError`。
    pub async fn execute(&self, spec: &EndpointSpec) -> CheckResult {
        let start_time = Instant::now();

        let observed = match self.probes.get(spec.scheme) {
            Some(probe) => {
                let probe_future = probe.probe(spec, self.probe_timeout);
                match AssertUnwindSafe(probe_future).catch_unwind().await {
                    Ok(observation) => observation,
                    Err(_) => {
                        error!("探测器发生panic: {} ({})", spec.name, spec.url);
                        Observation::ProtocolError
                    }
                }
            }
            None => {
                warn!("没有注册 {} 协议的探测器: {}", spec.scheme, spec.name);
                Observation::ProtocolError
            }
        };

        let elapsed = start_time.elapsed();
        trace!("探测完成: {} -> {} ({:?})", spec.name, observed, elapsed);

        CheckResult::new(spec, observed, elapsed)
    }
}
