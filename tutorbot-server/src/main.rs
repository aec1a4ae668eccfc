use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tutorbot_server::{app, build_agent, shutdown_signal, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    let agent = build_agent(&config).context("failed to build chat agent")?;
    let router = app(AppState::new(agent), config.max_concurrency);

    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "tutorbot listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
