use crate::sync::SyncLayer;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Starts the table and order poll loops. Both stop when `shutdown` is cancelled.
pub fn spawn_pollers(
    sync: SyncLayer,
    table_interval: Duration,
    order_interval: Duration,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let tables = {
        let sync = sync.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            info!(interval = ?table_interval, "Table poller started");
            let mut ticker = tokio::time::interval(table_interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = sync.poll_tables().await {
                            warn!(error = %e, "Table poll failed");
                        }
                    }
                }
            }
            info!("Table poller stopped");
        })
    };

    let orders = tokio::spawn(async move {
        info!(interval = ?order_interval, "Order poller started");
        let mut ticker = tokio::time::interval(order_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = sync.poll_orders().await {
                        warn!(error = %e, "Order poll failed");
                    }
                }
            }
        }
        info!("Order poller stopped");
    });

    vec![tables, orders]
}
