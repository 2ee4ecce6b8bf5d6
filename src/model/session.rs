//! Bill sessions: one continuous seating of a table, from arrival to payment.

use crate::model::{RecordViolation, SessionId, TableId};
use chrono::{DateTime, Utc};
use record_store::Record;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `active` until the bill is paid (`closed`) or the seating is aborted (`cancelled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionStatus::Active => "active",
            SessionStatus::Closed => "closed",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSession {
    pub id: SessionId,
    pub table_id: TableId,
    pub party_size: u32,
    pub guest_label: String,
    pub status: SessionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub table_id: TableId,
    pub party_size: u32,
    pub guest_label: String,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum SessionFilter {
    Id(SessionId),
    ActiveForTable(TableId),
    Table(TableId),
    Status(SessionStatus),
}

/// Terminal transitions; a session never returns to `active`.
#[derive(Debug, Clone)]
pub enum SessionPatch {
    Close { at: DateTime<Utc> },
    Cancel { at: DateTime<Utc> },
}

impl Record for BillSession {
    type Id = SessionId;
    type New = NewSession;
    type Filter = SessionFilter;
    type Patch = SessionPatch;
    type Error = RecordViolation;

    fn from_insert(id: SessionId, new: NewSession) -> Result<Self, RecordViolation> {
        if new.party_size == 0 {
            return Err(RecordViolation::EmptyParty);
        }
        Ok(Self {
            id,
            table_id: new.table_id,
            party_size: new.party_size,
            guest_label: new.guest_label,
            status: SessionStatus::Active,
            opened_at: new.opened_at,
            closed_at: None,
        })
    }

    fn matches(&self, filter: &SessionFilter) -> bool {
        match filter {
            SessionFilter::Id(id) => self.id == *id,
            SessionFilter::ActiveForTable(table_id) => {
                self.table_id == *table_id && self.status == SessionStatus::Active
            }
            SessionFilter::Table(table_id) => self.table_id == *table_id,
            SessionFilter::Status(status) => self.status == *status,
        }
    }

    fn apply_patch(&mut self, patch: &SessionPatch) -> Result<(), RecordViolation> {
        if self.status.is_terminal() {
            return Err(RecordViolation::SessionTerminal(self.id, self.status));
        }
        let (status, at) = match patch {
            SessionPatch::Close { at } => (SessionStatus::Closed, at),
            SessionPatch::Cancel { at } => (SessionStatus::Cancelled, at),
        };
        self.status = status;
        self.closed_at = Some(*at);
        Ok(())
    }
}
