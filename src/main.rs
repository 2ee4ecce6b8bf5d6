//! Walks one dine-in visit from seating to payment against in-process stores.

use anyhow::Context;
use dinein_orchestrator::clock::SystemClock;
use dinein_orchestrator::config::Config;
use dinein_orchestrator::intake::CartLine;
use dinein_orchestrator::lifecycle::setup_tracing;
use dinein_orchestrator::model::{ItemStatus, NewTable, PaymentMethod};
use dinein_orchestrator::notify::BroadcastNotifier;
use dinein_orchestrator::RestaurantSystem;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    setup_tracing(&config.log_filter);

    let notifier = BroadcastNotifier::new(64);
    let mut kitchen_display = notifier.subscribe();
    let display = tokio::spawn(async move {
        while let Ok(notification) = kitchen_display.recv().await {
            if let Ok(json) = serde_json::to_string(&notification) {
                info!(%json, "Kitchen display");
            }
        }
    });

    let mut system = RestaurantSystem::new(config, Arc::new(SystemClock), Arc::new(notifier));
    system.start_polling();

    let tables = system
        .registry
        .seed((1..=6).map(|number| NewTable { number, capacity: 4 }).collect())
        .await?;
    let table_id = tables
        .iter()
        .find(|t| t.number == 5)
        .map(|t| t.id)
        .context("table 5 was not seeded")?;

    let session = system
        .sessions
        .start_session(table_id, "Rossi", 2)
        .instrument(tracing::info_span!("seating"))
        .await?;
    info!(session = %session.id, "Party seated");

    let cart = vec![
        CartLine::new("dish_lasagna", "Lasagna", 2, Decimal::from(100)),
        CartLine::new("dish_tiramisu", "Tiramisu", 1, Decimal::from(50)).with_note("no cocoa"),
    ];
    let placed = system
        .intake
        .place_order(table_id, cart, "Rossi", "Marco")
        .instrument(tracing::info_span!("ordering"))
        .await?;
    for warning in &placed.warnings {
        warn!(step = %warning.step, message = %warning.message, "Order placed with warning");
    }
    let order_id = placed.value.order.id;

    let span = tracing::info_span!("kitchen");
    async {
        for index in 0..placed.value.items.len() {
            for status in [ItemStatus::Wait, ItemStatus::Ready, ItemStatus::Served] {
                system.kitchen.advance_item(order_id, index, status).await?;
            }
        }
        anyhow::Ok(())
    }
    .instrument(span)
    .await?;

    let bill = system
        .billing
        .open_bill_for_session(session.id)
        .await?
        .context("session has no open bill")?;
    let view = system.billing.bill_view(bill.id).await?;
    info!(invoice = %serde_json::to_string_pretty(&view)?, "Invoice");

    let settlement = system
        .billing
        .pay_and_close(bill.id, table_id, PaymentMethod::Card)
        .instrument(tracing::info_span!("payment"))
        .await?;
    info!(
        total = %settlement.value.bill.final_amount,
        table = %settlement.value.table.status,
        warnings = settlement.warnings.len(),
        "Visit finished"
    );

    let stats = system.billing.statistics().await?;
    info!(stats = %serde_json::to_string(&stats)?, "Statistics");

    system.shutdown().await.map_err(anyhow::Error::msg)?;
    display.abort();
    Ok(())
}
