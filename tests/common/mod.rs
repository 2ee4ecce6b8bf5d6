#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dinein_orchestrator::clients::{
    BillClient, OrderClient, OrderItemClient, PaymentClient, SessionClient, Stores, TableClient,
};
use dinein_orchestrator::clock::ManualClock;
use dinein_orchestrator::config::Config;
use dinein_orchestrator::intake::CartLine;
use dinein_orchestrator::model::{ItemStatus, NewTable, OrderId, TableId};
use dinein_orchestrator::notify::{Notification, Notifier, NotifyError};
use dinein_orchestrator::RestaurantSystem;
use record_store::{Record, StoreActor, StoreClient};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Keeps every published notification.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Refuses every notification.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn publish(&self, _: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Failed("kitchen printer offline".into()))
    }
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn opening_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap()
}

pub fn system_with(notifier: Arc<dyn Notifier>) -> (RestaurantSystem, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(opening_time()));
    let system = RestaurantSystem::new(Config::default(), clock.clone(), notifier);
    (system, clock)
}

pub fn system() -> (RestaurantSystem, Arc<ManualClock>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let (system, clock) = system_with(notifier.clone());
    (system, clock, notifier)
}

/// Seeds tables 1 to 6 and returns the id of table 5 (capacity 4).
pub async fn seed_tables(system: &RestaurantSystem) -> TableId {
    let tables = system
        .registry
        .seed(
            (1..=6)
                .map(|number| NewTable { number, capacity: 4 })
                .collect(),
        )
        .await
        .unwrap();
    tables.iter().find(|t| t.number == 5).unwrap().id
}

/// Two lasagne at 100 and one tiramisu at 50.
pub fn scenario_cart() -> Vec<CartLine> {
    vec![
        CartLine::new("dish_lasagna", "Lasagna", 2, Decimal::from(100)),
        CartLine::new("dish_tiramisu", "Tiramisu", 1, Decimal::from(50)),
    ]
}

/// Walks every item of an order through the whole pipeline.
pub async fn serve_all(system: &RestaurantSystem, order_id: OrderId, item_count: usize) {
    for index in 0..item_count {
        for status in [ItemStatus::Wait, ItemStatus::Ready, ItemStatus::Served] {
            system
                .kitchen
                .advance_item(order_id, index, status)
                .await
                .unwrap();
        }
    }
}

pub fn real_store<T: Record>() -> StoreClient<T> {
    let (actor, client) = StoreActor::<T>::new(32);
    tokio::spawn(actor.run());
    client
}

/// Stores backed by real actors, for tests that swap one of them for a mock.
pub fn real_stores() -> Stores {
    Stores {
        tables: TableClient::new(real_store()),
        sessions: SessionClient::new(real_store()),
        orders: OrderClient::new(real_store()),
        items: OrderItemClient::new(real_store()),
        bills: BillClient::new(real_store()),
        payments: PaymentClient::new(real_store()),
    }
}
