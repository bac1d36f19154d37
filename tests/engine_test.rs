//! 检测引擎集成测试
//!
//! 覆盖规范化、探测、执行与并发运行的端到端行为

use async_trait::async_trait;
use endpoint_vitals::config::{ConfigLoader, EndpointDescriptor, TomlConfigLoader};
use endpoint_vitals::error::{ConfigError, VitalsError};
use endpoint_vitals::health::{
    normalize_all, CheckConfig, CheckExecutor, ConcurrentRunner, EndpointSpec, Expectation,
    Observation, Probe, ProbeSet, Scheme,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

fn descriptor(name: &str, url: &str) -> EndpointDescriptor {
    EndpointDescriptor {
        name: name.to_string(),
        url: url.to_string(),
        expect_code: None,
        description: None,
    }
}

/// 固定延迟后返回 `Connected`
struct SleepingProbe {
    delay: Duration,
}

#[async_trait]
impl Probe for SleepingProbe {
    async fn probe(&self, _spec: &EndpointSpec, timeout_duration: Duration) -> Observation {
        match tokio::time::timeout(timeout_duration, tokio::time::sleep(self.delay)).await {
            Ok(()) => Observation::Connected,
            Err(_) => Observation::Unreachable,
        }
    }
}

/// 名称以 `boom` 开头时 panic
struct SelectivePanicProbe;

#[async_trait]
impl Probe for SelectivePanicProbe {
    async fn probe(&self, spec: &EndpointSpec, _timeout_duration: Duration) -> Observation {
        if spec.name.starts_with("boom") {
            panic!("probe exploded for {}", spec.name);
        }
        Observation::Connected
    }
}

#[test]
fn test_http_descriptor_normalization() {
    let spec = EndpointSpec::from_descriptor(&descriptor("api", "http://example.com:8080/health"))
        .unwrap();

    assert_eq!(spec.scheme, Scheme::Http);
    assert_eq!(spec.host, "example.com");
    assert_eq!(spec.port, 8080);
    assert_eq!(spec.path.as_deref(), Some("/health"));
    assert_eq!(spec.expected, Expectation::Status(200));
}

#[tokio::test]
async fn test_tcp_endpoint_connects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let spec = EndpointSpec::from_descriptor(&descriptor("db", &format!("tcp://127.0.0.1:{port}")))
        .unwrap();
    assert_eq!(spec.scheme, Scheme::Tcp);
    assert_eq!(spec.expected, Expectation::Connected);

    let executor = CheckExecutor::new(ProbeSet::standard().unwrap(), Duration::from_secs(2));
    let result = executor.execute(&spec).await;

    assert_eq!(result.observed(), Observation::Connected);
    assert!(result.is_healthy());
}

#[tokio::test]
async fn test_unresolvable_https_host_is_unhealthy() {
    let spec =
        EndpointSpec::from_descriptor(&descriptor("down", "https://nohost.invalid/")).unwrap();

    let executor = CheckExecutor::new(ProbeSet::standard().unwrap(), Duration::from_secs(1));
    let started = Instant::now();
    let result = executor.execute(&spec).await;

    assert!(matches!(
        result.observed(),
        Observation::Unreachable | Observation::Timeout
    ));
    assert!(!result.is_healthy());
    // 耗时受超时约束（留出调度余量）
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(result.elapsed() <= started.elapsed());
}

#[test]
fn test_tcp_without_port_is_rejected() {
    let err = EndpointSpec::from_descriptor(&descriptor("tcp-no-port", "tcp://10.0.0.5"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingPort { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_endpoints_run_in_parallel() {
    let descriptors: Vec<_> = (0..50)
        .map(|i| descriptor(&format!("svc-{i}"), &format!("tcp://10.0.0.{}:80", i + 1)))
        .collect();
    let specs = normalize_all(&descriptors).unwrap();

    let probes = ProbeSet::empty().with_probe(
        Scheme::Tcp,
        Arc::new(SleepingProbe {
            delay: Duration::from_millis(500),
        }),
    );
    let executor = Arc::new(CheckExecutor::new(probes, Duration::from_secs(2)));
    let runner = ConcurrentRunner::new(executor, 0);

    let started = Instant::now();
    let results = runner.run(specs).await;
    let wall = started.elapsed();

    assert_eq!(results.len(), 50);
    assert!(results.iter().all(|r| r.is_healthy()));
    // 顺序执行需要 25 秒
    assert!(wall < Duration::from_secs(3), "耗时过长: {wall:?}");
}

#[tokio::test]
async fn test_panicking_probe_does_not_affect_others() {
    let descriptors = vec![
        descriptor("first", "tcp://10.0.0.1:1"),
        descriptor("boom", "tcp://10.0.0.2:2"),
        descriptor("last", "tcp://10.0.0.3:3"),
    ];
    let specs = normalize_all(&descriptors).unwrap();

    let probes = ProbeSet::empty().with_probe(Scheme::Tcp, Arc::new(SelectivePanicProbe));
    let runner = ConcurrentRunner::new(
        Arc::new(CheckExecutor::new(probes, Duration::from_secs(1))),
        10,
    );

    let results = runner.run(specs).await;
    let names: Vec<_> = results.iter().map(|r| r.name()).collect();
    assert_eq!(names, ["first", "boom", "last"]);

    assert!(results[0].is_healthy());
    assert_eq!(results[1].observed(), Observation::ProtocolError);
    assert!(!results[1].is_healthy());
    assert!(results[2].is_healthy());
}

#[tokio::test]
async fn test_mixed_round_against_local_targets() {
    let mut server = mockito::Server::new_async().await;
    let ok_mock = server
        .mock("HEAD", "/health")
        .with_status(200)
        .create_async()
        .await;
    let moved_mock = server
        .mock("HEAD", "/old")
        .with_status(301)
        .with_header("location", "/new")
        .create_async()
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open_port = listener.local_addr().unwrap().port();
    let closed_port = {
        let temp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        temp.local_addr().unwrap().port()
    };

    let mut moved = descriptor("moved", &format!("{}/old", server.url()));
    moved.expect_code = Some(endpoint_vitals::config::ExpectedValue::Code(301));

    let descriptors = vec![
        descriptor("web", &format!("{}/health", server.url())),
        moved,
        descriptor("db", &format!("tcp://127.0.0.1:{open_port}")),
        descriptor("closed", &format!("tcp://127.0.0.1:{closed_port}")),
    ];
    let specs = normalize_all(&descriptors).unwrap();

    let config = CheckConfig::default().with_timeout(Duration::from_secs(2));
    let runner = ConcurrentRunner::from_config(&config).unwrap();
    let results = runner.run(specs).await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].observed(), Observation::Status(200));
    assert!(results[0].is_healthy());
    assert_eq!(results[1].observed(), Observation::Status(301));
    assert!(results[1].is_healthy());
    assert_eq!(results[2].observed(), Observation::Connected);
    assert_eq!(results[3].observed(), Observation::Unreachable);
    assert!(!results[3].is_healthy());

    ok_mock.assert_async().await;
    moved_mock.assert_async().await;
}

#[tokio::test]
async fn test_every_invalid_descriptor_is_reported() {
    let descriptors = vec![
        descriptor("ok", "http://example.com"),
        descriptor("ftp", "ftp://example.com"),
        descriptor("tcp-no-port", "tcp://10.0.0.5"),
    ];

    match normalize_all(&descriptors) {
        Err(VitalsError::InvalidEndpoints(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(matches!(errors[0], ConfigError::UnsupportedScheme { .. }));
            assert!(matches!(errors[1], ConfigError::MissingPort { .. }));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_yaml_service_list_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("services.yml");
    std::fs::write(
        &path,
        format!("- name: db\n  url: tcp://127.0.0.1:{port}\n  expect_code: connected\n"),
    )
    .unwrap();

    let config = TomlConfigLoader::new(false)
        .load_from_file(&path)
        .await
        .unwrap();
    let specs = normalize_all(&config.services).unwrap();
    let runner = ConcurrentRunner::from_config(&CheckConfig::from_global(&config.global)).unwrap();
    let results = runner.run(specs).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_healthy());
}
