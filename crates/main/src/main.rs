//! 主应用程序入口
//!
//! 加载配置，选择存储后端，启动超时清理任务和 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{spawn_periodic, SystemClock};
use config::AppConfig;
use infrastructure::Infrastructure;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{cors_layer, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(config = %config.redacted(), "配置已加载");

    let infrastructure = Infrastructure::connect(&config)
        .await
        .context("初始化存储失败")?;

    let timeout = chrono::Duration::from_std(config.presence.timeout())
        .context("presence.timeout_secs 超出范围")?;
    let state = AppState::new(
        infrastructure.participant_repository.clone(),
        infrastructure.message_repository.clone(),
        Arc::new(SystemClock),
        timeout,
    );

    let shutdown = CancellationToken::new();
    let sweeper = spawn_periodic(
        state.sweeper.clone(),
        config.presence.sweep_interval(),
        shutdown.clone(),
    );

    let app = router(state).layer(cors_layer(&config.server.cors_origins));
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;

    tracing::info!(
        address = %address,
        backend = ?infrastructure.backend,
        timeout_secs = config.presence.timeout_secs,
        sweep_interval_secs = config.presence.sweep_interval_secs,
        "留言板服务器已启动"
    );

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await?;

    // 信号之外的退出路径也要停止清理任务
    shutdown.cancel();
    if let Err(err) = sweeper.await {
        tracing::error!(error = %err, "清理任务异常退出");
    }

    tracing::info!("服务器已停止");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "无法监听 Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("收到停止信号，开始关闭");
}
