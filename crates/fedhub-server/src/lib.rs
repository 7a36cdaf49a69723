//! FedHub Server - 成员集群注册与资源同步 HTTP 服务
//!
//! 该模块负责按配置连接控制平面、目录服务和凭证存储，
//! 组装接口状态并启动 HTTP 服务。

pub mod api;
pub mod config;
pub mod health_check;
pub mod metrics;

use anyhow::{Context, Result};
use fedhub_controller::{
    HttpDirectoryClient, KubeClusterApi, KubeConnector, VaultCredentialResolver,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::metrics::ApiMetrics;

/// 按配置创建接口状态
pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let control_plane = KubeClusterApi::connect_control_plane(
        config.control_plane.kubeconfig.as_deref(),
        config.control_plane.context.clone(),
    )
    .await
    .context("连接控制平面失败")?;

    let directory = HttpDirectoryClient::new(config.directory.clone()).context("创建目录服务客户端失败")?;
    let credentials =
        VaultCredentialResolver::new(config.vault.clone()).context("创建凭证解析器失败")?;
    let metrics = ApiMetrics::new().context("注册指标失败")?;

    Ok(AppState::new(
        Arc::new(directory),
        Arc::new(credentials),
        Arc::new(KubeConnector),
        Arc::new(control_plane),
        config.registration,
        metrics,
    ))
}

/// 启动服务，收到 Ctrl-C 后优雅退出
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = config.socket_addr()?;
    let state = build_state(&config).await?;
    let router = api::router(state);

    info!("FedHub Server 监听 {}", addr);
    hyper::Server::try_bind(&addr)
        .with_context(|| format!("绑定地址 {} 失败", addr))?
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    info!("FedHub Server 已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("监听退出信号失败: {}", e);
    }
}
