//! Physical tables and their occupancy.

use crate::model::{RecordViolation, SessionId, TableId};
use record_store::Record;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Occupancy status of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
}

impl Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TableStatus::Available => "Available",
            TableStatus::Occupied => "Occupied",
            TableStatus::Reserved => "Reserved",
        };
        f.write_str(label)
    }
}

/// A physical table.
///
/// `session_id` is a weak back-reference (id only) to the active session; it is set when
/// the table becomes occupied and cleared when it is released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub number: u32,
    pub capacity: u32,
    pub status: TableStatus,
    pub occupant: Option<String>,
    pub session_id: Option<SessionId>,
}

/// Target occupancy of a table, carrying exactly the data each status needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Occupancy {
    Available,
    Occupied {
        occupant: Option<String>,
        session_id: SessionId,
    },
    Reserved {
        occupant: Option<String>,
    },
}

impl Occupancy {
    pub fn status(&self) -> TableStatus {
        match self {
            Occupancy::Available => TableStatus::Available,
            Occupancy::Occupied { .. } => TableStatus::Occupied,
            Occupancy::Reserved { .. } => TableStatus::Reserved,
        }
    }
}

impl Table {
    /// Applies an occupancy change. Releasing clears the occupant and the session
    /// back-reference; occupying sets both.
    pub fn occupy(&mut self, occupancy: &Occupancy) {
        self.status = occupancy.status();
        match occupancy {
            Occupancy::Available => {
                self.occupant = None;
                self.session_id = None;
            }
            Occupancy::Occupied {
                occupant,
                session_id,
            } => {
                self.occupant = occupant.clone();
                self.session_id = Some(*session_id);
            }
            Occupancy::Reserved { occupant } => {
                self.occupant = occupant.clone();
                self.session_id = None;
            }
        }
    }
}

/// Seed payload for a table.
#[derive(Debug, Clone)]
pub struct NewTable {
    pub number: u32,
    pub capacity: u32,
}

#[derive(Debug, Clone)]
pub enum TableFilter {
    All,
    Id(TableId),
    Number(u32),
    Status(TableStatus),
}

#[derive(Debug, Clone)]
pub enum TablePatch {
    Occupancy(Occupancy),
}

impl Record for Table {
    type Id = TableId;
    type New = NewTable;
    type Filter = TableFilter;
    type Patch = TablePatch;
    type Error = RecordViolation;

    fn from_insert(id: TableId, new: NewTable) -> Result<Self, RecordViolation> {
        if new.capacity == 0 {
            return Err(RecordViolation::ZeroCapacity);
        }
        Ok(Self {
            id,
            number: new.number,
            capacity: new.capacity,
            status: TableStatus::Available,
            occupant: None,
            session_id: None,
        })
    }

    fn matches(&self, filter: &TableFilter) -> bool {
        match filter {
            TableFilter::All => true,
            TableFilter::Id(id) => self.id == *id,
            TableFilter::Number(number) => self.number == *number,
            TableFilter::Status(status) => self.status == *status,
        }
    }

    fn apply_patch(&mut self, patch: &TablePatch) -> Result<(), RecordViolation> {
        match patch {
            TablePatch::Occupancy(occupancy) => self.occupy(occupancy),
        }
        Ok(())
    }
}
