//! 并发检测运行器
//!
//! 为每个端点派生一个独立任务并行执行检测，等待全部任务结束后
//! 按输入顺序返回结果。超时由各探测器自行控制，运行器不取消任何任务。

use crate::config::types::GlobalConfig;
use crate::error::Result;
use crate::health::executor::CheckExecutor;
use crate::health::probe::ProbeSet;
use crate::health::result::{CheckResult, Observation};
use crate::health::spec::EndpointSpec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// 检测配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// 每次探测的超时时间
    pub probe_timeout: Duration,
    /// 最大并发检测数，0 表示不限制
    pub max_concurrent_checks: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            max_concurrent_checks: 0,
        }
    }
}

impl CheckConfig {
    /// 从全局配置构建
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            probe_timeout: Duration::from_secs(global.request_timeout_seconds),
            max_concurrent_checks: global.max_concurrent_checks,
        }
    }

    /// 覆盖超时时间
    pub fn with_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }
}

/// 并发检测运行器
#[derive(Debug, Clone)]
pub struct ConcurrentRunner {
    /// 检测执行器
    executor: Arc<CheckExecutor>,
    /// 并发控制信号量
    semaphore: Option<Arc<Semaphore>>,
}

impl ConcurrentRunner {
    /// 创建运行器
    ///
    /// # 参数
    /// * `executor` - 检测执行器
    /// * `max_concurrent` - 最大并发数，0 表示不限制
    pub fn new(executor: Arc<CheckExecutor>, max_concurrent: usize) -> Self {
        let semaphore = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            executor,
            semaphore,
        }
    }

    /// 使用内置探测器按配置创建运行器
    pub fn from_config(config: &CheckConfig) -> Result<Self> {
        let executor = CheckExecutor::new(ProbeSet::standard()?, config.probe_timeout);
        Ok(Self::new(Arc::new(executor), config.max_concurrent_checks))
    }

    /// 并发检测全部端点
    ///
    /// 返回的结果与输入一一对应且顺序相同。单个任务 panic 或丢失
    /// 只影响它自己的结果位置，记为 `ProtocolError`。
    pub async fn run(&self, specs: Vec<EndpointSpec>) -> Vec<CheckResult> {
        let total = specs.len();
        info!("开始检测 {} 个端点", total);
        let round_start = Instant::now();

        let handles: Vec<_> = specs
            .iter()
            .cloned()
            .map(|spec| {
                let executor = Arc::clone(&self.executor);
                let semaphore = self.semaphore.clone();
                let started = Instant::now();
                let handle = tokio::spawn(async move {
                    let _permit = match semaphore {
                        Some(semaphore) => match semaphore.acquire_owned().await {
                            Ok(permit) => Some(permit),
                            Err(_) => {
                                warn!("获取并发许可失败，直接检测: {}", spec.name);
                                None
                            }
                        },
                        None => None,
                    };
                    executor.execute(&spec).await
                });
                (handle, started)
            })
            .collect();

        let joined =
            futures::future::join_all(handles.into_iter().map(|(handle, started)| async move {
                (handle.await, started)
            }))
            .await;

        let results: Vec<CheckResult> = specs
            .iter()
            .zip(joined)
            .map(|(spec, (outcome, started))| match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!("检测任务异常终止 {}: {}", spec.name, e);
                    CheckResult::new(spec, Observation::ProtocolError, started.elapsed())
                }
            })
            .collect();

        for result in &results {
            if result.is_healthy() {
                debug!(
                    "端点检测正常: {} -> {} ({}ms)",
                    result.name(),
                    result.observed(),
                    result.response_time_ms()
                );
            } else if result.observed().is_failure() {
                warn!(
                    "端点探测失败: {} -> {} ({}ms)",
                    result.name(),
                    result.observed(),
                    result.response_time_ms()
                );
            } else {
                warn!(
                    "端点结果不符: {} -> {}, 期望 {} ({}ms)",
                    result.name(),
                    result.observed(),
                    result.expected(),
                    result.response_time_ms()
                );
            }
        }

        info!(
            "检测完成: {}/{} 正常，耗时 {:?}",
            results.iter().filter(|r| r.is_healthy()).count(),
            total,
            round_start.elapsed()
        );

        results
    }
}
