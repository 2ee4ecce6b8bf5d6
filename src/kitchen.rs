//! # Kitchen Pipeline
//!
//! Every order item walks `in-kitchen → wait → ready → served`, one step at a time.
//! Advancing an item changes the kitchen board immediately (optimistically) and then
//! writes the store; a failed write puts the board back.
//!
//! Two moves have side effects:
//!
//! - **ready** tells the front of house the order can be picked up;
//! - **served**, when it is the last item of the order, completes the order and bills it.

use crate::billing::BillingEngine;
use crate::clients::{OrderClient, OrderItemClient};
use crate::error::Error;
use crate::model::{Bill, ItemStatus, Order, OrderId, OrderItem, OrderStatus};
use crate::notify::{publish_within, Notification, Notifier};
use crate::saga::{SagaLog, SagaOutcome, Step};
use crate::sync::SyncLayer;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Result of [`KitchenPipeline::advance_item`].
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedItem {
    pub item: OrderItem,
    /// Set when this move served the last item of the order.
    pub order_completed: bool,
    /// The bill the order landed on, when this move completed it.
    pub bill: Option<Bill>,
}

#[derive(Clone)]
pub struct KitchenPipeline {
    orders: OrderClient,
    items: OrderItemClient,
    billing: BillingEngine,
    sync: SyncLayer,
    notifier: Arc<dyn Notifier>,
    notify_deadline: Duration,
}

impl KitchenPipeline {
    pub fn new(
        orders: OrderClient,
        items: OrderItemClient,
        billing: BillingEngine,
        sync: SyncLayer,
        notifier: Arc<dyn Notifier>,
        notify_deadline: Duration,
    ) -> Self {
        Self {
            orders,
            items,
            billing,
            sync,
            notifier,
            notify_deadline,
        }
    }

    /// Moves the `item_index`-th item of an order (creation order, from 0) to `target`.
    ///
    /// `target` must be the immediate successor of the item's status, otherwise the call
    /// fails with `InvalidTransition` before anything is written.
    #[instrument(skip(self))]
    pub async fn advance_item(
        &self,
        order_id: OrderId,
        item_index: usize,
        target: ItemStatus,
    ) -> Result<SagaOutcome<AdvancedItem>, Error> {
        let mut log = SagaLog::new("advance_item");
        let order = self.orders.require(order_id).await?;
        if order.status == OrderStatus::Cancelled {
            return Err(Error::invalid_transition(order.status, target));
        }

        let mut items = self.items.for_order(order_id).await?;
        let current = items
            .get(item_index)
            .cloned()
            .ok_or_else(|| Error::not_found("order item", format!("{order_id}#{item_index}")))?;
        if !current.status.can_advance_to(target) {
            return Err(Error::invalid_transition(current.status, target));
        }

        let previous = self.sync.optimistic_item(order_id, current.id, target).await;
        let item = match self.items.set_status(current.id, target).await {
            Ok(item) => item,
            Err(e) => {
                self.sync.rollback_item(order_id, previous).await;
                return Err(log.abort(Step::WriteItemStatus, e));
            }
        };
        self.sync.confirm_item(item.clone()).await;
        info!(item = %item.id, status = %item.status, "Item advanced");
        items[item_index] = item.clone();
        if target == ItemStatus::Served {
            // Another terminal may have served a sibling since the read above.
            let fresh = self.items.for_order(order_id).await;
            if let Some(fresh) = log.auxiliary(Step::CompleteOrder, fresh) {
                items = fresh;
            }
        }

        let mut order_completed = false;
        let mut bill = None;
        match target {
            ItemStatus::Ready => {
                let notification = Notification::OrderReady {
                    order_id,
                    table_number: order.table_number,
                };
                let published =
                    publish_within(self.notifier.as_ref(), &notification, self.notify_deadline)
                        .await;
                log.auxiliary(Step::NotifyOrderReady, published.map_err(Error::from));
            }
            ItemStatus::Served if items.iter().all(|i| i.status == ItemStatus::Served) => {
                order_completed = true;
                let order = self.complete_order(&mut log, order).await;
                let billed = self.billing.bill_served_order(&order).await;
                bill = log.auxiliary(Step::BillServedOrder, billed);
            }
            _ => {}
        }

        Ok(log.finish(AdvancedItem {
            item,
            order_completed,
            bill,
        }))
    }

    async fn complete_order(&self, log: &mut SagaLog, order: Order) -> Order {
        if order.status == OrderStatus::Completed {
            return order;
        }
        let completed = self.orders.set_status(order.id, OrderStatus::Completed).await;
        match log.auxiliary(Step::CompleteOrder, completed) {
            Some(completed) => {
                info!(order = %completed.id, "Order completed");
                completed
            }
            None => order,
        }
    }
}
