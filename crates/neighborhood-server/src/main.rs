use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use neighborhood_api::{AppState, AppStateInner};
use neighborhood_engine::{EngineConfig, InMemoryIdentityStore, MemorySessionStore, Orchestrator};
use neighborhood_gateway::dispatcher::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neighborhood=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let config = EngineConfig::from_env();
    let host = std::env::var("NEIGHBORHOOD_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("NEIGHBORHOOD_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Shared state
    let dispatcher = Dispatcher::new();
    let orchestrator = Arc::new(Orchestrator::new(&config, dispatcher.clone()));
    let state: AppState = Arc::new(AppStateInner::new(
        orchestrator.clone(),
        dispatcher,
        Arc::new(InMemoryIdentityStore::new()),
        Arc::new(MemorySessionStore::new()),
    ));

    let app = neighborhood_api::router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Neighborhood server listening on {}", addr);
    info!(
        "Channel: {} (provider {}, model {}, reply delay {:?})",
        config.channel.name,
        if orchestrator.provider_enabled() { "enabled" } else { "disabled" },
        config.model,
        config.reply_delay,
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drop anything still waiting on its delay
    orchestrator.reset_session();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
