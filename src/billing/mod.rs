//! # Billing Engine
//!
//! Bills are derived views: the subtotal is always recomputed from the order items it
//! covers, never accumulated. Two kinds exist:
//!
//! - **Session bills** cover every non-cancelled order linked to a session. This is the
//!   primary path; order intake opens one as soon as an order is linked.
//! - **Order bills** cover a single order and are only created when the last item of an
//!   order with no session is served.
//!
//! [`BillingEngine::bill_served_order`] is where the two meet: an order with a session is
//! billed on its session bill, anything else gets an order bill.

pub mod stats;

use crate::clients::{BillClient, OrderClient, OrderItemClient, PaymentClient};
use crate::clock::Clock;
use crate::error::Error;
use crate::model::{
    Bill, BillFilter, BillId, BillScope, BillSession, NewBill, NewPayment, Occupancy, Order,
    OrderFilter, OrderId, OrderItem, OrderItemFilter, OrderStatus, Payment, PaymentFilter,
    PaymentMethod, PaymentStatus, SessionId, SettlementStatus, Table, TableId,
};
use crate::registry::TableRegistry;
use crate::saga::{SagaLog, SagaOutcome, Step};
use crate::sessions::SessionManager;
use record_store::RecordClient;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

pub use stats::{summarize, BillStats, DailyTotal};

/// Result of [`BillingEngine::pay_and_close`].
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    pub bill: Bill,
    pub payment: Option<Payment>,
    pub session: Option<BillSession>,
    pub table: Table,
}

/// A bill with the lines it was computed from, for invoice rendering.
#[derive(Debug, Clone, Serialize)]
pub struct BillView {
    pub bill: Bill,
    pub lines: Vec<OrderItem>,
}

#[derive(Clone)]
pub struct BillingEngine {
    bills: BillClient,
    payments: PaymentClient,
    orders: OrderClient,
    items: OrderItemClient,
    sessions: SessionManager,
    registry: TableRegistry,
    clock: Arc<dyn Clock>,
    tax_rate: Decimal,
}

impl BillingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bills: BillClient,
        payments: PaymentClient,
        orders: OrderClient,
        items: OrderItemClient,
        sessions: SessionManager,
        registry: TableRegistry,
        clock: Arc<dyn Clock>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            bills,
            payments,
            orders,
            items,
            sessions,
            registry,
            clock,
            tax_rate,
        }
    }

    /// The session's open bill, created with a zero subtotal if it has none.
    #[instrument(skip(self))]
    pub async fn ensure_session_bill(&self, session_id: SessionId) -> Result<Bill, Error> {
        let (bill, created) = self
            .bills
            .get_or_create(
                BillFilter::OpenForSession(session_id),
                self.new_bill(BillScope::Session(session_id), Decimal::ZERO),
            )
            .await?;
        if created {
            info!(bill = %bill.id, session = %session_id, "Session bill opened");
        }
        Ok(bill)
    }

    /// Recomputes the subtotal from the bill's current items and writes it back.
    ///
    /// Safe to repeat. Closed bills are returned untouched, and the write is skipped when
    /// the subtotal has not changed.
    #[instrument(skip(self))]
    pub async fn recalculate_total(&self, bill_id: BillId) -> Result<Bill, Error> {
        let bill = self.bills.require(bill_id).await?;
        if !bill.is_open() {
            return Ok(bill);
        }
        let subtotal = subtotal(&self.lines(bill.scope).await?);
        if subtotal == bill.subtotal {
            return Ok(bill);
        }
        let bill = self
            .bills
            .set_subtotal(bill_id, subtotal, self.clock.now())
            .await?;
        info!(bill = %bill.id, subtotal = %bill.subtotal, total = %bill.final_amount, "Bill recalculated");
        Ok(bill)
    }

    /// Bills an order whose items have all been served.
    #[instrument(skip(self, order), fields(order = %order.id))]
    pub async fn bill_served_order(&self, order: &Order) -> Result<Bill, Error> {
        if let Some(session_id) = order.session_id {
            let bill = self.ensure_session_bill(session_id).await?;
            return self.recalculate_total(bill.id).await;
        }

        let items = self.items.for_order(order.id).await?;
        let (bill, created) = self
            .bills
            .get_or_create(
                BillFilter::ForOrder(order.id),
                self.new_bill(BillScope::Order(order.id), subtotal(&items)),
            )
            .await?;
        if created {
            info!(bill = %bill.id, total = %bill.final_amount, "Order bill created");
            return Ok(bill);
        }
        self.recalculate_total(bill.id).await
    }

    /// Settles a bill, closes its session and frees the table.
    ///
    /// Settling the bill and releasing the table must succeed; recording the payment and
    /// closing the session are best-effort. Re-running on an already paid bill skips the
    /// payment and finishes the remaining steps.
    ///
    /// Paying an order bill while the party's session bill is still unpaid leaves the
    /// session open and the table occupied.
    #[instrument(skip(self))]
    pub async fn pay_and_close(
        &self,
        bill_id: BillId,
        table_id: TableId,
        method: PaymentMethod,
    ) -> Result<SagaOutcome<Settlement>, Error> {
        let mut log = SagaLog::new("pay_and_close");
        let bill = self.bills.require(bill_id).await?;
        let now = self.clock.now();

        let (bill, payment) = if bill.payment_status == PaymentStatus::Paid {
            let completed = self
                .payments
                .find_one(PaymentFilter::BillWithStatus(bill_id, SettlementStatus::Completed))
                .await;
            (bill, log.auxiliary(Step::OpenPayment, completed).flatten())
        } else {
            let pending = log.auxiliary(
                Step::OpenPayment,
                self.payments
                    .open(NewPayment {
                        bill_id,
                        amount: bill.final_amount,
                        method,
                        created_at: now,
                    })
                    .await,
            );

            let settled = match self.bills.settle(bill_id, now).await {
                Ok(settled) => settled,
                Err(e) => {
                    if let Some(pending) = &pending {
                        let failed = self
                            .payments
                            .transition(pending.id, SettlementStatus::Failed, now)
                            .await;
                        log.auxiliary(Step::FailPayment, failed);
                    }
                    return Err(log.abort(Step::SettleBill, e));
                }
            };

            let payment = match pending {
                Some(pending) => {
                    let completed = self
                        .payments
                        .transition(pending.id, SettlementStatus::Completed, now)
                        .await;
                    log.auxiliary(Step::ConfirmPayment, completed)
                }
                None => None,
            };
            (settled, payment)
        };

        let seating = match self.seating(&bill, table_id).await {
            Ok(seating) => seating,
            Err(e) => {
                log.auxiliary::<()>(Step::CloseSession, Err(e));
                Seating::Nobody
            }
        };
        let (session, release) = match seating {
            Seating::Close(session_id) => {
                let closed = self.sessions.close_session_record(session_id).await;
                (log.auxiliary(Step::CloseSession, closed), true)
            }
            Seating::StillOwing(session_id, open_bill) => {
                log.warn(
                    Step::CloseSession,
                    format!("{session_id} still owes {open_bill}, {table_id} stays occupied"),
                );
                (None, false)
            }
            Seating::Nobody => (None, true),
        };

        let table = if release {
            log.critical(
                Step::ReleaseTable,
                self.registry
                    .set_occupancy(table_id, Occupancy::Available)
                    .await,
            )?
        } else {
            self.registry.require(table_id).await?
        };

        info!(bill = %bill.id, total = %bill.final_amount, %table_id, released = release, "Bill paid");
        Ok(log.finish(Settlement {
            bill,
            payment,
            session,
            table,
        }))
    }

    /// Refunds a paid bill and its completed payment. Table and session are left alone.
    #[instrument(skip(self))]
    pub async fn refund(&self, bill_id: BillId) -> Result<SagaOutcome<Bill>, Error> {
        let mut log = SagaLog::new("refund");
        let now = self.clock.now();
        let bill = log.critical(Step::RefundBill, self.bills.refund(bill_id, now).await)?;

        let completed = self
            .payments
            .find_one(PaymentFilter::BillWithStatus(bill_id, SettlementStatus::Completed))
            .await;
        if let Some(payment) = log.auxiliary(Step::RefundPayment, completed).flatten() {
            let refunded = self
                .payments
                .transition(payment.id, SettlementStatus::Refunded, now)
                .await;
            log.auxiliary(Step::RefundPayment, refunded);
        }

        info!(bill = %bill.id, "Bill refunded");
        Ok(log.finish(bill))
    }

    pub async fn get_bill(&self, bill_id: BillId) -> Result<Option<Bill>, Error> {
        self.bills.get(bill_id).await
    }

    pub async fn bill_for_order(&self, order_id: OrderId) -> Result<Option<Bill>, Error> {
        self.bills.find_one(BillFilter::ForOrder(order_id)).await
    }

    pub async fn open_bill_for_session(&self, session_id: SessionId) -> Result<Option<Bill>, Error> {
        self.bills
            .find_one(BillFilter::OpenForSession(session_id))
            .await
    }

    pub async fn bill_view(&self, bill_id: BillId) -> Result<BillView, Error> {
        let bill = self.bills.require(bill_id).await?;
        let lines = self.lines(bill.scope).await?;
        Ok(BillView { bill, lines })
    }

    pub async fn payments_for(&self, bill_id: BillId) -> Result<Vec<Payment>, Error> {
        self.payments.select(PaymentFilter::Bill(bill_id)).await
    }

    pub async fn statistics(&self) -> Result<BillStats, Error> {
        let bills = self.bills.select(BillFilter::All).await?;
        Ok(summarize(&bills))
    }

    fn new_bill(&self, scope: BillScope, subtotal: Decimal) -> NewBill {
        NewBill {
            scope,
            subtotal,
            discount: Decimal::ZERO,
            tax_rate: self.tax_rate,
            created_at: self.clock.now(),
        }
    }

    /// Items a bill covers. A session bill skips cancelled orders and orders that
    /// already carry their own order bill.
    async fn lines(&self, scope: BillScope) -> Result<Vec<OrderItem>, Error> {
        match scope {
            BillScope::Order(order_id) => self.items.for_order(order_id).await,
            BillScope::Session(session_id) => {
                let mut order_ids: Vec<OrderId> = self
                    .orders
                    .select(OrderFilter::Session(session_id))
                    .await?
                    .into_iter()
                    .filter(|order| order.status != OrderStatus::Cancelled)
                    .map(|order| order.id)
                    .collect();
                if order_ids.is_empty() {
                    return Ok(Vec::new());
                }
                let billed: Vec<OrderId> = self
                    .bills
                    .select(BillFilter::ForOrders(order_ids.clone()))
                    .await?
                    .iter()
                    .filter_map(Bill::order_id)
                    .collect();
                order_ids.retain(|order_id| !billed.contains(order_id));
                if order_ids.is_empty() {
                    return Ok(Vec::new());
                }
                self.items.select(OrderItemFilter::Orders(order_ids)).await
            }
        }
    }

    /// Decides what settling `bill` does to the party at `table_id`.
    ///
    /// An order bill belongs to the session the order is linked to or, for an order
    /// placed before the party was seated, to the table's active session. That session
    /// is only closed when it does not owe anything on its own bill.
    async fn seating(&self, bill: &Bill, table_id: TableId) -> Result<Seating, Error> {
        let order_id = match bill.scope {
            BillScope::Session(session_id) => return Ok(Seating::Close(session_id)),
            BillScope::Order(order_id) => order_id,
        };
        let session_id = match self.orders.require(order_id).await?.session_id {
            Some(session_id) => session_id,
            None => match self.sessions.get_active_session(table_id).await? {
                Some(session) => session.id,
                None => return Ok(Seating::Nobody),
            },
        };
        match self.open_bill_for_session(session_id).await? {
            Some(open) if open.final_amount > Decimal::ZERO => {
                Ok(Seating::StillOwing(session_id, open.id))
            }
            _ => Ok(Seating::Close(session_id)),
        }
    }
}

enum Seating {
    Close(SessionId),
    /// The session's own bill is still unpaid.
    StillOwing(SessionId, BillId),
    Nobody,
}

/// `Σ(unit_price × quantity − discount)`.
pub fn subtotal(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::line_total).sum()
}
