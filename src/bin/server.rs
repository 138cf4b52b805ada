//! TTL store server.
//!
//! Runs a TCP server that accepts one command per line, as JSON or text.

use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_store::{server, ServerArgs, Store};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_store=info,server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = ServerArgs::parse();
    let store = Store::new(args.store_config());
    info!(
        key_ttl = ?args.key_ttl,
        queue_capacity = args.queue_capacity,
        sweep_policy = ?args.sweep_policy,
        "created store"
    );

    let listener = TcpListener::bind(&args.listen_addr).await?;
    info!(addr = %args.listen_addr, "listening");

    tokio::select! {
        _ = server::serve(listener, store.clone()) => {}
        result = signal::ctrl_c() => {
            result?;
            info!("received Ctrl+C, shutting down");
        }
    }

    let stats = store.stats();
    tokio::task::spawn_blocking(move || store.shutdown()).await?;
    info!(%stats, "store stopped");
    Ok(())
}
