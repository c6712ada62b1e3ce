// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root: resolve configuration, wire logging, build the
//! hub, and serve the HTTP/WS facade until a shutdown signal arrives
//! (spec §4.I, §11).

mod api_error;
mod app_state;
mod config;
mod routes;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use agent_hub_engine::hub::HubConfig;
use agent_hub_engine::Hub;

use app_state::AppState;
use config::{Args, Config};

const FRONTEND_DIR: &str = "frontend/dist";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(args)?;

    tokio::fs::create_dir_all(&config.data_dir).await.with_context(|| {
        format!("creating data directory {}", config.data_dir.display())
    })?;
    let _log_guard = init_logging(&config)?;

    let hub = Hub::new(HubConfig {
        data_dir: config.data_dir.clone(),
        agent_config_file: config.agent_config_file.clone(),
        hub_base_url: config.hub_base_url.clone(),
        title_model: config.title_model.clone(),
        title_max_chars: 72,
    })
    .context("constructing hub")?;

    if config.clean_start {
        hub.chat_supervisor.clean_start().await;
    }
    hub.resume_interrupted_builds();

    let app_state = AppState { hub: hub.clone(), hub_base_url: config.hub_base_url.clone(), no_frontend_build: config.no_frontend_build };

    let frontend_dir = (!config.no_frontend_build).then(|| PathBuf::from(FRONTEND_DIR));
    let app = routes::router(app_state, frontend_dir.as_deref());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "agent hub listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    hub.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            return;
        };
        signal.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

/// stderr + a rolling-free append-only file sink under `<data>/logs`
/// (spec §11 ambient stack): the non-blocking writer's guard must stay
/// alive for the process lifetime, so it's returned rather than
/// dropped.
fn init_logging(config: &Config) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "agent-hub.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer().with_ansi(false).json().with_writer(non_blocking);

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();

    Ok(guard)
}
