//! # Records
//!
//! Plain data structures for the five records of a dine-in visit plus payments, each
//! implementing [`record_store::Record`] so it can live in its own store actor.
//!
//! A record only enforces what it can check by looking at itself: positive quantities,
//! non-negative prices, terminal states that never change again, one-step kitchen
//! moves. Anything that needs a second record (a session's table, a bill's items)
//! belongs to the services.

pub mod bill;
pub mod ids;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod session;
pub mod table;

pub use bill::*;
pub use ids::*;
pub use order::*;
pub use order_item::*;
pub use payment::*;
pub use session::*;
pub use table::*;

use rust_decimal::Decimal;
use thiserror::Error;

/// A write that a record refused on its own terms.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordViolation {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    #[error("Party size must be at least 1")]
    EmptyParty,

    #[error("Amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Discount {discount} exceeds line total {line_total}")]
    DiscountExceedsLine { discount: Decimal, line_total: Decimal },

    #[error("Capacity must be at least 1")]
    ZeroCapacity,

    #[error("Session {0} is already {1}")]
    SessionTerminal(SessionId, SessionStatus),

    #[error("Item cannot move from {from} to {to}")]
    ItemTransition { from: ItemStatus, to: ItemStatus },

    #[error("Order {0} is already {1}")]
    OrderTerminal(OrderId, OrderStatus),

    #[error("Bill {0} is closed")]
    BillClosed(BillId),

    #[error("Bill {0} cannot be refunded while {1}")]
    NotRefundable(BillId, PaymentStatus),

    #[error("Payment {0} cannot move from {1} to {2}")]
    PaymentTransition(PaymentId, SettlementStatus, SettlementStatus),
}
