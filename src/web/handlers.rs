//! Web 路由处理函数
//!
//! 实现 Web 服务器的路由处理逻辑

use super::{WebAppState, WebEndpointStatus};
use crate::config::{ConfigLoader, TomlConfigLoader};
use crate::error::Result;
use crate::health::{normalize_all, CheckConfig, CheckResult, ConcurrentRunner, RunSummary};
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use tracing::{debug, error};

/// 仪表板模板
#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    endpoints: Vec<WebEndpointStatus>,
    last_updated: String,
    total_count: usize,
    healthy_count: usize,
    unhealthy_count: usize,
    show_problems_only: bool,
}

/// API 状态响应结构
#[derive(serde::Serialize)]
struct ApiStatusResponse {
    endpoints: Vec<WebEndpointStatus>,
    summary: RunSummary,
    last_updated: String,
}

/// 重新读取配置并执行一轮检测
///
/// 超时和并发上限同样取自本次读取的全局配置。
async fn run_round(state: &WebAppState) -> Result<Vec<CheckResult>> {
    let loader = TomlConfigLoader::new(true);
    let config = loader.load_from_file(&state.config_path).await?;
    let specs = normalize_all(&config.services)?;
    debug!("Web请求触发检测，端点数量: {}", specs.len());
    let runner = ConcurrentRunner::from_config(&CheckConfig::from_global(&config.global))?;
    Ok(runner.run(specs).await)
}

/// 仪表板页面处理函数
pub async fn dashboard(State(app_state): State<WebAppState>) -> Response {
    let results = match run_round(&app_state).await {
        Ok(results) => results,
        Err(e) => {
            error!("执行检测失败: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("执行检测失败: {e}"))
                .into_response();
        }
    };

    // 统计数据不受过滤影响
    let summary = RunSummary::from_results(&results);
    let mut endpoints: Vec<WebEndpointStatus> = results.iter().map(Into::into).collect();
    if app_state.config.show_problems_only {
        endpoints.retain(|e| !e.ok);
    }

    let template = DashboardTemplate {
        endpoints,
        last_updated: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string(),
        total_count: summary.total,
        healthy_count: summary.healthy,
        unhealthy_count: summary.unhealthy,
        show_problems_only: app_state.config.show_problems_only,
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("模板渲染失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "模板渲染失败").into_response()
        }
    }
}

/// API 状态端点处理函数
///
/// 总是返回全部端点，由调用方决定如何过滤。
pub async fn api_status(State(app_state): State<WebAppState>) -> Response {
    match run_round(&app_state).await {
        Ok(results) => {
            let response = ApiStatusResponse {
                summary: RunSummary::from_results(&results),
                endpoints: results.iter().map(Into::into).collect(),
                last_updated: chrono::Utc::now().to_rfc3339(),
            };
            Json(response).into_response()
        }
        Err(e) => {
            error!("执行检测失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::WebConfig;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn write_config(dir: &Path, open_port: u16, closed_port: u16) -> PathBuf {
        let path = dir.join("config.toml");
        let content = format!(
            r#"
[global]
request_timeout_seconds = 2

[[services]]
name = "open-port"
url = "tcp://127.0.0.1:{open_port}"

[[services]]
name = "closed-port"
url = "tcp://127.0.0.1:{closed_port}"
"#
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn app_state(config_path: PathBuf, config: WebConfig) -> WebAppState {
        WebAppState::new(config_path, config)
    }

    #[tokio::test]
    async fn test_api_status_handler() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), open_port, closed_port().await);

        let response = api_status(State(app_state(path, WebConfig::default()))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        let endpoints = value["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0]["name"], "open-port");
        assert_eq!(endpoints[0]["ok"], true);
        assert_eq!(endpoints[1]["status"], "Unreachable");
        assert_eq!(value["summary"]["healthy"], 1);
    }

    #[tokio::test]
    async fn test_dashboard_handler() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), open_port, closed_port().await);

        let response = dashboard(State(app_state(path, WebConfig::default()))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("open-port"));
        assert!(html.contains("closed-port"));
    }

    #[tokio::test]
    async fn test_dashboard_with_filtering() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), open_port, closed_port().await);

        let config = WebConfig {
            show_problems_only: true,
            ..WebConfig::default()
        };
        let response = dashboard(State(app_state(path, config))).await;
        let html = body_text(response).await;

        assert!(!html.contains("open-port"));
        assert!(html.contains("closed-port"));
    }

    #[tokio::test]
    async fn test_missing_config_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");

        let response = api_status(State(app_state(path, WebConfig::default()))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(value["error"].as_str().unwrap().contains("absent.toml"));
    }

    #[tokio::test]
    async fn test_each_request_uses_current_config() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), open_port, closed_port().await);
        let state = app_state(path.clone(), WebConfig::default());

        let first = api_status(State(state.clone())).await;
        let value: serde_json::Value = serde_json::from_str(&body_text(first).await).unwrap();
        assert_eq!(value["endpoints"].as_array().unwrap().len(), 2);

        // 改写端点列表和超时，同一个状态的下一次请求应立即生效
        let content = format!(
            r#"
[global]
request_timeout_seconds = 1

[[services]]
name = "renamed"
url = "tcp://127.0.0.1:{open_port}"
"#
        );
        std::fs::write(&path, content).unwrap();

        let second = api_status(State(state)).await;
        let value: serde_json::Value = serde_json::from_str(&body_text(second).await).unwrap();
        let endpoints = value["endpoints"].as_array().unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0]["name"], "renamed");
        assert_eq!(endpoints[0]["ok"], true);
    }

    #[tokio::test]
    async fn test_timeout_comes_from_current_config() {
        // 接受连接但从不回应的服务端
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let content = format!(
            r#"
[global]
request_timeout_seconds = 1

[[services]]
name = "silent"
url = "http://127.0.0.1:{port}/"
"#
        );
        std::fs::write(&path, content).unwrap();

        let start = Instant::now();
        let response = api_status(State(app_state(path, WebConfig::default()))).await;
        let elapsed = start.elapsed();

        let value: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["endpoints"][0]["status"], "Timeout");
        assert!(elapsed >= Duration::from_millis(900), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "elapsed {elapsed:?}");
    }
}
