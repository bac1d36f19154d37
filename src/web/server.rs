//! Web服务器实现
//!
//! 提供HTTP服务器和路由管理

use super::{handlers, WebAppState};
use crate::error::{Result, VitalsError};
use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 创建路由
pub fn create_router(state: WebAppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/api/status", get(handlers::api_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Web服务器
pub struct WebServer {
    /// 共享状态
    state: WebAppState,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(state: WebAppState) -> Self {
        Self { state }
    }

    /// 监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let config = &self.state.config;
        format!("{}:{}", config.bind_address, config.port)
            .parse()
            .map_err(|e| {
                VitalsError::Other(anyhow::anyhow!(
                    "无效的监听地址 {}:{}: {}",
                    config.bind_address,
                    config.port,
                    e
                ))
            })
    }

    /// 启动Web服务器，直到 `shutdown` 完成
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Web服务器已启动: http://{}", listener.local_addr()?);
        info!("API地址: http://{}/api/status", listener.local_addr()?);

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}

/// 等待 Ctrl+C 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("监听 Ctrl+C 失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("接收到 Ctrl+C，正在关闭..."),
        _ = terminate => info!("接收到 SIGTERM，正在关闭..."),
    }
}
