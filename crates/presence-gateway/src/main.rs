//! Presence alert gateway binary.

use std::sync::Arc;

use clap::Parser;
use presence_core::{
    LogSink, MemoryStore, MessageSink, SledStore, SledStoreConfig, SubscriberStore, TelegramSink,
};
use presence_gateway::{create_router, AppState, Args, GatewayConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presence_gateway=info,presence_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line args
    let args = Args::parse();
    let config = GatewayConfig::from_args(&args).map_err(anyhow::Error::msg)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.listen_addr,
        threshold = config.fanout.threshold,
        source = %config.fanout.event_source,
        "starting presence gateway"
    );

    let store: Arc<dyn SubscriberStore> = match &config.data_path {
        Some(path) => {
            let store = SledStore::open(SledStoreConfig::new(path))?;
            info!(path = %path.display(), subscribers = store.len(), "subscriber store opened");
            Arc::new(store)
        }
        None => {
            info!("no data path configured, subscribers are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let sink: Arc<dyn MessageSink> = match &config.telegram {
        Some(telegram) => Arc::new(TelegramSink::new(telegram.clone())?),
        None => {
            info!("no telegram token configured, outbound messages are only logged");
            Arc::new(LogSink)
        }
    };

    let state = AppState::new(store, sink, config.fanout.clone());
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("gateway listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
