//! Bills and their derived totals.

use crate::model::{BillId, OrderId, RecordViolation, SessionId};
use chrono::{DateTime, Utc};
use record_store::Record;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Refunded => "Refunded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Open,
    Closed,
}

/// What a bill aggregates: every order of a session, or a single order when no
/// session was involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum BillScope {
    Session(SessionId),
    Order(OrderId),
}

/// A bill.
///
/// `tax` and `final_amount` are never written directly; they follow from `subtotal`,
/// `discount` and `tax_rate` every time the subtotal changes, so
/// `final_amount == subtotal - discount + tax` holds for every stored bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub scope: BillScope,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Bill {
    pub fn session_id(&self) -> Option<SessionId> {
        match self.scope {
            BillScope::Session(id) => Some(id),
            BillScope::Order(_) => None,
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match self.scope {
            BillScope::Order(id) => Some(id),
            BillScope::Session(_) => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == BillStatus::Open
    }

    fn set_subtotal(&mut self, subtotal: Decimal) -> Result<(), RecordViolation> {
        if subtotal.is_sign_negative() && !subtotal.is_zero() {
            return Err(RecordViolation::NegativeAmount(subtotal));
        }
        self.subtotal = subtotal;
        self.tax = (subtotal * self.tax_rate).round_dp(2);
        self.final_amount = subtotal - self.discount + self.tax;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewBill {
    pub scope: BillScope,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum BillFilter {
    All,
    Id(BillId),
    OpenForSession(SessionId),
    Session(SessionId),
    ForOrder(OrderId),
    /// Order-scoped bills of any of these orders.
    ForOrders(Vec<OrderId>),
}

#[derive(Debug, Clone)]
pub enum BillPatch {
    Subtotal { subtotal: Decimal, at: DateTime<Utc> },
    Settle { at: DateTime<Utc> },
    Refund { at: DateTime<Utc> },
}

impl Record for Bill {
    type Id = BillId;
    type New = NewBill;
    type Filter = BillFilter;
    type Patch = BillPatch;
    type Error = RecordViolation;

    fn from_insert(id: BillId, new: NewBill) -> Result<Self, RecordViolation> {
        for amount in [new.discount, new.tax_rate] {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(RecordViolation::NegativeAmount(amount));
            }
        }
        let mut bill = Self {
            id,
            scope: new.scope,
            subtotal: Decimal::ZERO,
            discount: new.discount,
            tax_rate: new.tax_rate,
            tax: Decimal::ZERO,
            final_amount: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
            status: BillStatus::Open,
            created_at: new.created_at,
            updated_at: new.created_at,
            paid_at: None,
        };
        bill.set_subtotal(new.subtotal)?;
        Ok(bill)
    }

    fn matches(&self, filter: &BillFilter) -> bool {
        match filter {
            BillFilter::All => true,
            BillFilter::Id(id) => self.id == *id,
            BillFilter::OpenForSession(session_id) => {
                self.is_open() && self.session_id() == Some(*session_id)
            }
            BillFilter::Session(session_id) => self.session_id() == Some(*session_id),
            BillFilter::ForOrder(order_id) => self.order_id() == Some(*order_id),
            BillFilter::ForOrders(order_ids) => self
                .order_id()
                .is_some_and(|order_id| order_ids.contains(&order_id)),
        }
    }

    fn apply_patch(&mut self, patch: &BillPatch) -> Result<(), RecordViolation> {
        match patch {
            BillPatch::Subtotal { subtotal, at } => {
                if !self.is_open() {
                    return Err(RecordViolation::BillClosed(self.id));
                }
                self.set_subtotal(*subtotal)?;
                self.updated_at = *at;
            }
            // Settling twice is a no-op so a re-driven payment does not fail.
            BillPatch::Settle { .. } if self.payment_status == PaymentStatus::Paid => {}
            BillPatch::Settle { at } => {
                if !self.is_open() {
                    return Err(RecordViolation::BillClosed(self.id));
                }
                self.status = BillStatus::Closed;
                self.payment_status = PaymentStatus::Paid;
                self.paid_at = Some(*at);
                self.updated_at = *at;
            }
            BillPatch::Refund { at } => {
                if self.payment_status != PaymentStatus::Paid {
                    return Err(RecordViolation::NotRefundable(self.id, self.payment_status));
                }
                self.payment_status = PaymentStatus::Refunded;
                self.updated_at = *at;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 19, 30, 0).unwrap()
    }

    fn open_bill(subtotal: &str, discount: &str) -> Bill {
        Bill::from_insert(
            BillId(1),
            NewBill {
                scope: BillScope::Session(SessionId(1)),
                subtotal: dec(subtotal),
                discount: dec(discount),
                tax_rate: dec("0.18"),
                created_at: at(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_totals_follow_subtotal() {
        let mut bill = open_bill("0", "0");
        assert_eq!(bill.final_amount, Decimal::ZERO);

        bill.apply_patch(&BillPatch::Subtotal {
            subtotal: dec("250"),
            at: at(),
        })
        .unwrap();
        assert_eq!(bill.tax, dec("45"));
        assert_eq!(bill.final_amount, dec("295"));
    }

    #[test]
    fn test_discount_is_taken_off_final() {
        let bill = open_bill("100", "10");
        assert_eq!(bill.tax, dec("18"));
        assert_eq!(bill.final_amount, bill.subtotal - bill.discount + bill.tax);
        assert_eq!(bill.final_amount, dec("108"));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let bill = open_bill("10.05", "0");
        assert_eq!(bill.tax, dec("1.81"));
    }

    #[test]
    fn test_settle_closes_and_is_repeatable() {
        let mut bill = open_bill("50", "0");
        bill.apply_patch(&BillPatch::Settle { at: at() }).unwrap();
        assert_eq!(bill.status, BillStatus::Closed);
        assert_eq!(bill.payment_status, PaymentStatus::Paid);
        assert_eq!(bill.paid_at, Some(at()));

        bill.apply_patch(&BillPatch::Settle { at: at() }).unwrap();
        assert_eq!(
            bill.apply_patch(&BillPatch::Subtotal {
                subtotal: dec("60"),
                at: at()
            }),
            Err(RecordViolation::BillClosed(BillId(1)))
        );
    }

    #[test]
    fn test_refund_requires_paid() {
        let mut bill = open_bill("50", "0");
        assert_eq!(
            bill.apply_patch(&BillPatch::Refund { at: at() }),
            Err(RecordViolation::NotRefundable(BillId(1), PaymentStatus::Pending))
        );
        bill.apply_patch(&BillPatch::Settle { at: at() }).unwrap();
        bill.apply_patch(&BillPatch::Refund { at: at() }).unwrap();
        assert_eq!(bill.payment_status, PaymentStatus::Refunded);
    }
}
