//! Order relay worker
//!
//! Consumes conversation events, runs the order dialogue per conversation
//! and publishes replies until SIGINT/SIGTERM.

use order_relay::config::RelayConfig;
use order_relay::{shutdown, worker};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    order_relay::init_tracing("order_relay=info");

    let config = RelayConfig::from_env("worker")?;
    tracing::info!(
        inbound = %config.inbound_queue,
        outbound = %config.outbound_queue,
        consumer_tag = %config.consumer_tag,
        locale = %config.locale,
        idle_ttl_secs = config.idle_ttl.map(|ttl| ttl.as_secs()),
        "Starting worker"
    );

    let stop = shutdown::install()?;
    let stats = match worker::serve(&config, stop).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!(error = %e, "Worker failed");
            return Err(e.into());
        }
    };

    tracing::info!(
        acknowledged = stats.acknowledged,
        rejected = stats.rejected,
        "Worker stopped"
    );
    Ok(())
}
