//! Portrait Daemon - emotion-driven portrait animation over HTTP
//!
//! Keeps the animation backend loaded and serves render requests. Emotions
//! are resolved to head-pose and expression parameters before each render.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portrait_daemon::{
    api, config::ServiceConfig, gpu, renderer::warm_up, AppState, PassthroughRenderer,
    PortraitRenderer,
};

#[derive(Debug, Parser)]
#[command(name = "portrait-daemon", version, about)]
struct Cli {
    /// Configuration file (created with defaults if missing)
    #[arg(long, env = "PORTRAIT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long, env = "PORTRAIT_HOST")]
    host: Option<String>,

    /// Override the bind port
    #[arg(long, env = "PORTRAIT_PORT")]
    port: Option<u16>,

    /// Override the inference device (auto, cpu, cuda)
    #[arg(long, env = "PORTRAIT_DEVICE")]
    device: Option<String>,

    /// Override the output directory
    #[arg(long, env = "PORTRAIT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portrait_daemon=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🎭 Starting Portrait Daemon v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load_from(path),
        None => ServiceConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(device) = cli.device {
        config.device = device;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    config.validate().context("Invalid configuration")?;

    info!("📋 Configuration loaded from {}", config.config_path.display());

    // Detect GPU
    let gpu_info = gpu::detect_gpu();
    if gpu_info.is_none() {
        warn!("⚠️ No GPU detected, using CPU (slower)");
    }
    let device = gpu::select_device(&config.device, gpu_info.as_ref())?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    // Initialize renderer
    info!("🔧 Loading renderer (model: {})...", config.model_path);
    let renderer: Arc<dyn PortraitRenderer> = Arc::new(PassthroughRenderer::new(
        device.clone(),
        config.model_version.clone(),
    ));
    if config.warmup {
        warm_up(renderer.as_ref());
    }

    info!("✓ Renderer ready");
    info!("  - Backend: {}", renderer.name());
    info!("  - Device: {}", device);
    info!("  - Model version: {}", renderer.model_version());
    info!("  - Output: {}", config.output_dir.display());

    let addr = config.bind_addr();
    let state = AppState::new(config, Arc::clone(&renderer), gpu_info);
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Portrait daemon listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    renderer.cleanup();
    info!("✓ Renderer released");
    info!("👋 Portrait daemon stopped");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("🛑 Received SIGTERM, shutting down...");
        },
    }
}
