use anyhow::Result;

use seqlink::config::Config;
use seqlink::http::PermalinkServer;
use seqlink::storage::open_repository;

/// Start the permalink server and block until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    let repo = open_repository(&config.database)?;
    let server = PermalinkServer::new(config, repo)?;

    println!("{}", server.info().display());
    println!("Press Ctrl+C to stop.\n");

    // Start with graceful shutdown
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    Ok(())
}
