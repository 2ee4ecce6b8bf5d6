//! # Order Intake
//!
//! Turns a cart into an order with its items and hooks it onto the table's session bill.
//! Only creating the order row is critical; everything after it is forward-only and
//! reported as warnings, so a placed order is never rolled back because the kitchen
//! could not be notified.

use crate::billing::BillingEngine;
use crate::clients::{OrderClient, OrderItemClient};
use crate::clock::Clock;
use crate::error::Error;
use crate::model::{
    Bill, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatus, TableId,
};
use crate::notify::{publish_within, Notification, Notifier};
use crate::registry::TableRegistry;
use crate::saga::{SagaLog, SagaOutcome, Step};
use crate::sessions::SessionManager;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// One cart line. Price and discount are a snapshot of the menu at the moment of
/// ordering; later menu changes never reach placed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub dish_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

impl CartLine {
    pub fn new(dish_id: &str, name: &str, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            dish_id: dish_id.to_string(),
            name: name.to_string(),
            quantity,
            unit_price,
            discount: Decimal::ZERO,
            note: None,
        }
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Result of [`OrderIntake::place_order`].
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// The session bill, when the order could be linked to one.
    pub bill: Option<Bill>,
}

#[derive(Clone)]
pub struct OrderIntake {
    orders: OrderClient,
    items: OrderItemClient,
    registry: TableRegistry,
    sessions: SessionManager,
    billing: BillingEngine,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    notify_deadline: Duration,
}

impl OrderIntake {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: OrderClient,
        items: OrderItemClient,
        registry: TableRegistry,
        sessions: SessionManager,
        billing: BillingEngine,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        notify_deadline: Duration,
    ) -> Self {
        Self {
            orders,
            items,
            registry,
            sessions,
            billing,
            notifier,
            clock,
            notify_deadline,
        }
    }

    /// Places an order for a table.
    ///
    /// Fails with `NotFound` for an unknown table and with `OrderCreationFailed` when the
    /// cart is unusable or the order row cannot be written. Once the order row exists the
    /// call succeeds; a missing session, a failed link, failed item creation or a failed
    /// notification come back as warnings.
    #[instrument(skip(self, cart), fields(lines = cart.len()))]
    pub async fn place_order(
        &self,
        table_id: TableId,
        cart: Vec<CartLine>,
        customer_label: &str,
        staff_label: &str,
    ) -> Result<SagaOutcome<PlacedOrder>, Error> {
        let table = self.registry.require(table_id).await?;
        validate_cart(&cart)?;
        let mut log = SagaLog::new("place_order");

        let mut order = log.critical(
            Step::CreateOrder,
            self.orders
                .create(NewOrder {
                    table_number: table.number,
                    customer_label: customer_label.to_string(),
                    staff_label: staff_label.to_string(),
                    placed_at: self.clock.now(),
                })
                .await,
        )?;
        info!(order = %order.id, table = table.number, "Order created");

        let session = match self.sessions.get_active_session(table_id).await {
            Ok(Some(session)) => Some(session),
            Ok(None) => {
                log.warn(
                    Step::ResolveSession,
                    format!("{table_id} has no active session, {} is not billed yet", order.id),
                );
                None
            }
            Err(e) => log.auxiliary(Step::ResolveSession, Err(e)),
        };

        let mut bill = None;
        if let Some(session) = &session {
            bill = log.auxiliary(
                Step::EnsureSessionBill,
                self.billing.ensure_session_bill(session.id).await,
            );
            if let Some(linked) = log.auxiliary(
                Step::LinkOrder,
                self.orders.link_session(order.id, session.id).await,
            ) {
                order = linked;
            }
        }

        let lines = cart
            .into_iter()
            .map(|line| NewOrderItem {
                order_id: order.id,
                dish_id: line.dish_id,
                name: line.name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                discount: line.discount,
                note: line.note,
            })
            .collect();
        let items = log
            .auxiliary(Step::CreateItems, self.items.create_all(lines).await)
            .unwrap_or_default();

        // Recalculate once the items exist so the subtotal includes them.
        let linked_bill = bill.as_ref().filter(|_| order.session_id.is_some()).map(|b| b.id);
        if let Some(bill_id) = linked_bill {
            let recalculated = self.billing.recalculate_total(bill_id).await;
            if let Some(updated) = log.auxiliary(Step::RecalculateBill, recalculated) {
                bill = Some(updated);
            }
        }

        let notification = Notification::NewOrder {
            order_id: order.id,
            table_number: table.number,
            item_count: items.len(),
        };
        let published =
            publish_within(self.notifier.as_ref(), &notification, self.notify_deadline).await;
        log.auxiliary(Step::NotifyNewOrder, published.map_err(Error::from));

        Ok(log.finish(PlacedOrder { order, items, bill }))
    }

    /// Links an order placed while its table had no session to the session that is
    /// active now, and folds it into the session bill.
    #[instrument(skip(self))]
    pub async fn link_to_session(&self, order_id: OrderId) -> Result<SagaOutcome<Order>, Error> {
        let mut log = SagaLog::new("link_to_session");
        let order = self.orders.require(order_id).await?;
        if order.session_id.is_some() {
            return Ok(log.finish(order));
        }

        let table = self
            .registry
            .find_by_number(order.table_number)
            .await?
            .ok_or_else(|| Error::not_found("table number", order.table_number))?;
        let session = self
            .sessions
            .get_active_session(table.id)
            .await?
            .ok_or(Error::NoActiveSession(table.id))?;

        let order = log.critical(
            Step::RelinkOrder,
            self.orders.link_session(order_id, session.id).await,
        )?;
        let order_bill = self.billing.bill_for_order(order_id).await;
        if let Some(Some(bill)) = log.auxiliary(Step::EnsureSessionBill, order_bill) {
            // The session bill leaves the order out, so the order is not charged twice.
            log.warn(
                Step::EnsureSessionBill,
                format!("{order_id} stays on its own {}", bill.id),
            );
        } else if let Some(bill) = log.auxiliary(
            Step::EnsureSessionBill,
            self.billing.ensure_session_bill(session.id).await,
        ) {
            let recalculated = self.billing.recalculate_total(bill.id).await;
            log.auxiliary(Step::RecalculateBill, recalculated);
        }

        info!(order = %order.id, session = %session.id, "Order linked to session");
        Ok(log.finish(order))
    }

    /// Cancels a pending order. Its items drop out of the session bill.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<SagaOutcome<Order>, Error> {
        let mut log = SagaLog::new("cancel_order");
        let current = self.orders.require(order_id).await?;
        if current.status != OrderStatus::Pending {
            return Err(Error::invalid_transition(current.status, OrderStatus::Cancelled));
        }
        let order = log.critical(
            Step::CancelOrder,
            self.orders.set_status(order_id, OrderStatus::Cancelled).await,
        )?;

        if let Some(session_id) = order.session_id {
            let open = self.billing.open_bill_for_session(session_id).await;
            if let Some(bill) = log.auxiliary(Step::RecalculateBill, open).flatten() {
                let recalculated = self.billing.recalculate_total(bill.id).await;
                log.auxiliary(Step::RecalculateBill, recalculated);
            }
        }

        info!(order = %order.id, "Order cancelled");
        Ok(log.finish(order))
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, Error> {
        record_store::RecordClient::get(&self.orders, order_id).await
    }

    pub async fn items_of(&self, order_id: OrderId) -> Result<Vec<OrderItem>, Error> {
        self.items.for_order(order_id).await
    }
}

fn validate_cart(cart: &[CartLine]) -> Result<(), Error> {
    if cart.is_empty() {
        return Err(Error::OrderCreationFailed("cart is empty".to_string()));
    }
    for line in cart {
        if line.quantity == 0 {
            return Err(Error::OrderCreationFailed(format!(
                "{}: quantity must be at least 1",
                line.name
            )));
        }
        let line_total = line.unit_price * Decimal::from(line.quantity);
        if line.unit_price.is_sign_negative()
            || line.discount.is_sign_negative()
            || line.discount > line_total
        {
            return Err(Error::OrderCreationFailed(format!(
                "{}: price {} with discount {} is not billable",
                line.name, line.unit_price, line.discount
            )));
        }
    }
    Ok(())
}
