use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trackconf::TrackConfig;
use trackside::{sessions, telemetry, web, AppState};

/// Sports assessment API server
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./trackside.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// OTLP gRPC endpoint for OpenTelemetry (e.g., "127.0.0.1:4317")
    #[arg(long)]
    otlp_endpoint: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        TrackConfig::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.infra.bind.http_port = port;
    }
    if let Some(host) = cli.host {
        config.infra.bind.host = host;
    }
    if let Some(endpoint) = cli.otlp_endpoint {
        config.infra.telemetry.otlp_endpoint = Some(endpoint);
    }
    config.validate().context("Invalid configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let telemetry =
        telemetry::init(&config.infra.telemetry).context("Failed to initialize telemetry")?;

    let state = AppState::from_config(&config).context("Failed to build pose detector")?;
    tracing::info!(
        pose_detector = state.pose.name(),
        demo_program = %config.bootstrap.demo.program,
        "Collaborators ready"
    );

    let addr = config.infra.bind.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🏃 Assessment API listening on http://{}", addr);
    tracing::info!("   Health: http://{}/health", addr);

    let shutdown_token = CancellationToken::new();
    let app_router = web::app(state.clone(), &config.infra);

    let shutdown_token_srv = shutdown_token.clone();
    let server = axum::serve(listener, app_router).with_graceful_shutdown(async move {
        shutdown_token_srv.cancelled().await;
        tracing::info!("Server shutdown signal received");
    });
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!("Server shutdown with error: {:?}", e);
        }
    });

    let stats_sessions = state.sessions.clone();
    let stats_demos = state.demos.clone();
    let stats_ct = shutdown_token.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let session_stats = stats_sessions.stats();
                    tracing::info!(
                        sessions.active = session_stats.active,
                        demos.launched = stats_demos.list().len(),
                        "Server stats"
                    );
                }
                _ = stats_ct.cancelled() => break,
            }
        }
    });

    let limits = &config.infra.sessions;
    let cleanup_handle = sessions::spawn_cleanup_task(
        state.sessions.clone(),
        Duration::from_secs(limits.cleanup_interval_secs),
        Duration::from_secs(limits.max_idle_secs),
        shutdown_token.clone(),
    );

    wait_for_signal().await?;
    shutdown_token.cancel();

    if let Err(e) = server_handle.await {
        tracing::error!("Server task failed: {:?}", e);
    }
    if let Err(e) = cleanup_handle.await {
        tracing::error!("Cleanup task failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    telemetry.shutdown();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to set up SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Received Ctrl+C, shutting down");
    Ok(())
}
