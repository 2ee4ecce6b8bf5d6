//! Orders placed at a table.

use crate::model::{OrderId, RecordViolation, SessionId};
use chrono::{DateTime, Utc};
use record_store::Record;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Coarse order status; per-dish progress lives on the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// An order. Table number and labels are copied in at placement so the kitchen board
/// can render without further lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub table_number: u32,
    pub customer_label: String,
    pub staff_label: String,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub table_number: u32,
    pub customer_label: String,
    pub staff_label: String,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum OrderFilter {
    All,
    Id(OrderId),
    Session(SessionId),
    Status(OrderStatus),
    Unlinked { table_number: u32 },
}

/// Only the session link and the coarse status ever change after placement.
#[derive(Debug, Clone)]
pub enum OrderPatch {
    LinkSession(SessionId),
    Status(OrderStatus),
}

impl Record for Order {
    type Id = OrderId;
    type New = NewOrder;
    type Filter = OrderFilter;
    type Patch = OrderPatch;
    type Error = RecordViolation;

    fn from_insert(id: OrderId, new: NewOrder) -> Result<Self, RecordViolation> {
        Ok(Self {
            id,
            table_number: new.table_number,
            customer_label: new.customer_label,
            staff_label: new.staff_label,
            placed_at: new.placed_at,
            status: OrderStatus::Pending,
            session_id: None,
        })
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        match filter {
            OrderFilter::All => true,
            OrderFilter::Id(id) => self.id == *id,
            OrderFilter::Session(session_id) => self.session_id == Some(*session_id),
            OrderFilter::Status(status) => self.status == *status,
            OrderFilter::Unlinked { table_number } => {
                self.session_id.is_none() && self.table_number == *table_number
            }
        }
    }

    fn apply_patch(&mut self, patch: &OrderPatch) -> Result<(), RecordViolation> {
        match patch {
            OrderPatch::LinkSession(session_id) => self.session_id = Some(*session_id),
            OrderPatch::Status(status) if *status == self.status => {}
            OrderPatch::Status(status) => {
                if self.status != OrderStatus::Pending {
                    return Err(RecordViolation::OrderTerminal(self.id, self.status));
                }
                self.status = *status;
            }
        }
        Ok(())
    }
}
