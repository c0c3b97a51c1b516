mod cli;
mod server;

use std::sync::Arc;

use clap::Parser;
use eyre::WrapErr;

use tagbook_core::{Datastore, ItemCatalog, SequenceIdGenerator};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    // Generate a random API token for this server session.
    let api_token = {
        use rand::Rng;
        let bytes: [u8; 16] = rand::thread_rng().r#gen();
        hex_encode(bytes)
    };

    let datastore = match &args.data_dir {
        Some(dir) => Datastore::open(dir, args.partitions).context("open user data store")?,
        None => {
            tracing::warn!("no --data-dir given, data is kept in memory only");
            Datastore::open_in_memory(args.partitions).context("open in-memory user data store")?
        }
    };
    let ids = SequenceIdGenerator::new(args.node_id).context("configure id generator")?;
    let catalog = ItemCatalog::new(Arc::new(datastore), Arc::new(ids));

    let state = server::AppState {
        catalog: Arc::new(catalog),
        api_token: api_token.clone(),
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let origin = format!("http://{}:{}", args.bind, args.port);
    let router = server::build_router(state, &origin);

    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0, it is accessible from the network");
    }

    println!();
    println!("  Tagbook is running:");
    println!("    API:       http://{bind_addr}/api/v1");
    println!("    Token:     {api_token}");
    println!();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!(node_id = args.node_id, partitions = args.partitions, "listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("run HTTP server")?;

    Ok(())
}

/// Tiny hex-encoding helper to avoid adding a `hex` crate dependency.
fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encode_pads_each_byte() {
        assert_eq!(hex_encode([0x00, 0x0f, 0xab]), "000fab");
    }
}
