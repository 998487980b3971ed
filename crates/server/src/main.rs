//! squirrel server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use squirrel_client::{FaviconConfig, HttpFaviconLookup};
use squirrel_core::{AppConfig, ArchiveController, SchemaManager};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(db_path = %config.db_path.display(), "Starting squirrel server on stdio transport");

    let lookup = HttpFaviconLookup::new(FaviconConfig::from(&config))?;
    let controller = Arc::new(ArchiveController::from_config(&config, Arc::new(lookup)));

    let schema = Arc::clone(controller.schema());
    let handler = handler::SquirrelServer::new(Arc::clone(&controller), config.allow_duplicate_urls);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    run_until_shutdown(server.waiting(), shutdown_signal(), &schema).await
}

/// Serve until the service quits or `shutdown` fires, then close the archive once.
///
/// Dropping the running service cancels it, so a signal ends the stdio loop too.
async fn run_until_shutdown<W, R, S>(service: W, shutdown: S, schema: &SchemaManager) -> Result<()>
where
    W: Future<Output = Result<R, tokio::task::JoinError>>,
    R: std::fmt::Debug,
    S: Future<Output = ()>,
{
    tokio::select! {
        quit = service => {
            let reason = quit?;
            tracing::info!(?reason, "server stopped");
        }
        () = shutdown => tracing::info!("shutdown signalled, stopping server"),
    }

    schema.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
