//! 健康检测模块
//!
//! 提供端点规范化、协议探测、单端点检测执行和并发运行功能

pub mod executor;
pub mod probe;
pub mod result;
pub mod runner;
pub mod spec;

// 重新导出主要类型
pub use executor::CheckExecutor;
pub use probe::{HttpProbe, Probe, ProbeSet, TcpProbe};
pub use result::{CheckResult, Observation, RunSummary};
pub use runner::{CheckConfig, ConcurrentRunner};
pub use spec::{normalize_all, EndpointSpec, Expectation, Scheme};
