//! # Synchronization Layer
//!
//! Observers (a kitchen board, a floor plan) see two converged collections: every
//! [`Table`] and every order as an [`OrderView`]. Both are refreshed by polling the store,
//! and both are also changed locally the moment a service issues a write, before the
//! store has confirmed it.
//!
//! The two must not fight. A local write suppresses poll results for its sub-resource
//! ([`SyncKey`]) for a cool-down; a poll arriving inside that window keeps the local row
//! (see [`merge`]). A failed write releases the window at once and reverts the local row,
//! so the next poll heals whatever is left.
//!
//! Snapshots are published on `tokio::sync::watch` channels.

pub mod merge;
pub mod poller;
pub mod suppression;

pub use merge::{merge, Keyed};
pub use poller::spawn_pollers;
pub use suppression::{SuppressionWindow, SyncKey};

use crate::clients::{OrderClient, OrderItemClient, TableClient};
use crate::clock::Clock;
use crate::error::Error;
use crate::model::{
    ItemStatus, Occupancy, Order, OrderFilter, OrderId, OrderItem, OrderItemFilter, OrderItemId,
    Table, TableFilter, TableId,
};
use record_store::RecordClient;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, instrument};

/// An order with its items, as rendered on the kitchen board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

struct SyncState {
    window: SuppressionWindow,
    tables: Vec<Table>,
    orders: Vec<OrderView>,
}

struct Shared {
    state: Mutex<SyncState>,
    tables_tx: watch::Sender<Vec<Table>>,
    orders_tx: watch::Sender<Vec<OrderView>>,
    tables: TableClient,
    orders: OrderClient,
    items: OrderItemClient,
}

/// Process-scoped holder of the observed collections. Cloning shares the same state.
#[derive(Clone)]
pub struct SyncLayer {
    shared: Arc<Shared>,
}

impl SyncLayer {
    pub fn new(
        tables: TableClient,
        orders: OrderClient,
        items: OrderItemClient,
        cooldown: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (tables_tx, _) = watch::channel(Vec::new());
        let (orders_tx, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SyncState {
                    window: SuppressionWindow::new(cooldown, clock),
                    tables: Vec::new(),
                    orders: Vec::new(),
                }),
                tables_tx,
                orders_tx,
                tables,
                orders,
                items,
            }),
        }
    }

    pub fn subscribe_tables(&self) -> watch::Receiver<Vec<Table>> {
        self.shared.tables_tx.subscribe()
    }

    pub fn subscribe_orders(&self) -> watch::Receiver<Vec<OrderView>> {
        self.shared.orders_tx.subscribe()
    }

    pub fn tables(&self) -> Vec<Table> {
        self.shared.tables_tx.borrow().clone()
    }

    pub fn orders(&self) -> Vec<OrderView> {
        self.shared.orders_tx.borrow().clone()
    }

    pub async fn is_suppressed(&self, key: SyncKey) -> bool {
        self.shared.state.lock().await.window.is_suppressed(key)
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Reads every table from the store and reconciles it with the local copy.
    #[instrument(skip(self))]
    pub async fn poll_tables(&self) -> Result<Vec<Table>, Error> {
        let remote = self.shared.tables.select(TableFilter::All).await?;
        let mut state = self.shared.state.lock().await;
        let suppressed = state.window.active();
        let merged = merge(&state.tables, remote, &suppressed);
        state.tables = merged;
        debug!(tables = state.tables.len(), suppressed = suppressed.len(), "Tables polled");
        self.publish_tables(&state);
        Ok(state.tables.clone())
    }

    /// Reads every order and its items from the store and reconciles them with the local copy.
    #[instrument(skip(self))]
    pub async fn poll_orders(&self) -> Result<Vec<OrderView>, Error> {
        let orders = self.shared.orders.select(OrderFilter::All).await?;
        let ids = orders.iter().map(|order| order.id).collect();
        let items = self.shared.items.select(OrderItemFilter::Orders(ids)).await?;

        let mut grouped: BTreeMap<OrderId, Vec<OrderItem>> = BTreeMap::new();
        for item in items {
            grouped.entry(item.order_id).or_default().push(item);
        }
        let remote = orders
            .into_iter()
            .map(|order| OrderView {
                items: grouped.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect();

        let mut state = self.shared.state.lock().await;
        let suppressed = state.window.active();
        let merged = merge(&state.orders, remote, &suppressed);
        state.orders = merged;
        debug!(orders = state.orders.len(), suppressed = suppressed.len(), "Orders polled");
        self.publish_orders(&state);
        Ok(state.orders.clone())
    }

    // =========================================================================
    // Optimistic writes
    // =========================================================================

    /// Applies an occupancy change locally and suppresses the table. Returns the row as it
    /// was, for [`rollback_table`](Self::rollback_table).
    pub async fn optimistic_table(&self, table_id: TableId, occupancy: &Occupancy) -> Option<Table> {
        let mut state = self.shared.state.lock().await;
        state.window.suppress(SyncKey::Table(table_id));
        let table = state.tables.iter_mut().find(|t| t.id == table_id)?;
        let previous = table.clone();
        table.occupy(occupancy);
        self.publish_tables(&state);
        Some(previous)
    }

    /// Replaces the local row with the one the store returned.
    pub async fn confirm_table(&self, table: Table) {
        let mut state = self.shared.state.lock().await;
        match state.tables.iter_mut().find(|t| t.id == table.id) {
            Some(local) => *local = table,
            None => state.tables.push(table),
        }
        self.publish_tables(&state);
    }

    /// Undoes an optimistic table change after a failed write.
    pub async fn rollback_table(&self, table_id: TableId, previous: Option<Table>) {
        let mut state = self.shared.state.lock().await;
        state.window.release(SyncKey::Table(table_id));
        if let Some(previous) = previous {
            if let Some(local) = state.tables.iter_mut().find(|t| t.id == table_id) {
                *local = previous;
            }
        }
        self.publish_tables(&state);
    }

    /// Applies an item status change locally and suppresses its order. Returns the item as
    /// it was, for [`rollback_item`](Self::rollback_item).
    pub async fn optimistic_item(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
        status: ItemStatus,
    ) -> Option<OrderItem> {
        let mut state = self.shared.state.lock().await;
        state.window.suppress(SyncKey::Order(order_id));
        let item = state
            .orders
            .iter_mut()
            .find(|view| view.order.id == order_id)?
            .items
            .iter_mut()
            .find(|item| item.id == item_id)?;
        let previous = item.clone();
        item.status = status;
        self.publish_orders(&state);
        Some(previous)
    }

    pub async fn confirm_item(&self, item: OrderItem) {
        let mut state = self.shared.state.lock().await;
        if let Some(view) = state.orders.iter_mut().find(|v| v.order.id == item.order_id) {
            match view.items.iter_mut().find(|i| i.id == item.id) {
                Some(local) => *local = item,
                None => view.items.push(item),
            }
        }
        self.publish_orders(&state);
    }

    pub async fn rollback_item(&self, order_id: OrderId, previous: Option<OrderItem>) {
        let mut state = self.shared.state.lock().await;
        state.window.release(SyncKey::Order(order_id));
        if let Some(previous) = previous {
            let item_id = previous.id;
            let local = state
                .orders
                .iter_mut()
                .find(|view| view.order.id == order_id)
                .and_then(|view| view.items.iter_mut().find(|item| item.id == item_id));
            if let Some(local) = local {
                *local = previous;
            }
        }
        self.publish_orders(&state);
    }

    /// Ends a suppression window early so the next poll is taken as is.
    pub async fn release(&self, key: SyncKey) {
        self.shared.state.lock().await.window.release(key);
    }

    fn publish_tables(&self, state: &SyncState) {
        self.shared.tables_tx.send_replace(state.tables.clone());
    }

    fn publish_orders(&self, state: &SyncState) {
        self.shared.orders_tx.send_replace(state.orders.clone());
    }
}
