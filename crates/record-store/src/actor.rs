//! # Store Actor
//!
//! This module defines the `StoreActor`, the task that owns one record table. It is the
//! "Server" side of the store: requests are processed one at a time, so the table needs
//! no lock and every request sees a consistent table.

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::record::Record;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The actor that owns every row of one record type.
///
/// # Concurrency Model
/// Each table runs in its own Tokio task and handles its requests sequentially. A request
/// is therefore atomic with respect to its own table (an `Update` touching three rows is
/// all-or-nothing) but there is no transaction spanning two tables. Cross-table workflows
/// are the caller's problem.
///
/// # Usage Pattern
///
/// 1. **Create**: `StoreActor::new()` returns the actor and a client.
/// 2. **Run**: spawn `actor.run()` on the runtime.
/// 3. **Use**: clone the client wherever the table is needed.
///
/// # Implementation Details
///
/// Rows live in a `BTreeMap` keyed by id, and ids come from a `u32` counter starting at 1,
/// so `select` answers in insertion order.
///
/// * **Insert**: every payload goes through `Record::from_insert` before any row is stored.
/// * **Update**: the patch is applied to copies of all matching rows first; the copies only
///   replace the originals if every one of them accepted the patch.
/// * **GetOrInsert**: returns the first matching row, or inserts `row` when none matches.
pub struct StoreActor<T: Record> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    rows: BTreeMap<T::Id, T>,
    next_id: u32,
}

impl<T: Record> StoreActor<T> {
    /// Creates a new `StoreActor` and its associated `StoreClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait for space when
    /// it is full.
    pub fn new(buffer_size: usize) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            rows: BTreeMap::new(),
            next_id: 1,
        };
        (actor, StoreClient::new(sender))
    }

    fn allocate(&mut self, new: T::New) -> Result<T, StoreError> {
        let id = T::Id::from(self.next_id);
        let row = T::from_insert(id, new).map_err(|e| StoreError::Rejected(Box::new(e)))?;
        self.next_id += 1;
        Ok(row)
    }

    fn insert_rows(&mut self, rows: Vec<T::New>) -> Result<Vec<T>, StoreError> {
        let first_id = self.next_id;
        let mut built = Vec::with_capacity(rows.len());
        for new in rows {
            match self.allocate(new) {
                Ok(row) => built.push(row),
                Err(e) => {
                    // Nothing was stored yet, hand the ids back.
                    self.next_id = first_id;
                    return Err(e);
                }
            }
        }
        for (offset, row) in built.iter().enumerate() {
            self.rows
                .insert(T::Id::from(first_id + offset as u32), row.clone());
        }
        Ok(built)
    }

    fn update_rows(&mut self, filter: &T::Filter, patch: &T::Patch) -> Result<Vec<T>, StoreError> {
        let mut patched = Vec::new();
        for (id, row) in self.rows.iter().filter(|(_, row)| row.matches(filter)) {
            let mut copy = row.clone();
            copy.apply_patch(patch)
                .map_err(|e| StoreError::Rejected(Box::new(e)))?;
            patched.push((id.clone(), copy));
        }
        let mut updated = Vec::with_capacity(patched.len());
        for (id, row) in patched {
            self.rows.insert(id, row.clone());
            updated.push(row);
        }
        Ok(updated)
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self) {
        // Extract just the type name (e.g., "Table" instead of "dinein_orchestrator::model::table::Table")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Insert { rows, respond_to } => {
                    debug!(entity_type, ?rows, "Insert");
                    let result = self.insert_rows(rows);
                    match &result {
                        Ok(rows) => info!(entity_type, inserted = rows.len(), size = self.rows.len(), "Inserted"),
                        Err(e) => warn!(entity_type, error = %e, "Insert failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Get { id, respond_to } => {
                    let row = self.rows.get(&id).cloned();
                    debug!(entity_type, %id, found = row.is_some(), "Get");
                    let _ = respond_to.send(Ok(row));
                }
                StoreRequest::Select { filter, respond_to } => {
                    let rows: Vec<T> = self
                        .rows
                        .values()
                        .filter(|row| row.matches(&filter))
                        .cloned()
                        .collect();
                    debug!(entity_type, ?filter, matched = rows.len(), "Select");
                    let _ = respond_to.send(Ok(rows));
                }
                StoreRequest::Update {
                    filter,
                    patch,
                    respond_to,
                } => {
                    debug!(entity_type, ?filter, ?patch, "Update");
                    let result = self.update_rows(&filter, &patch);
                    match &result {
                        Ok(rows) => info!(entity_type, updated = rows.len(), "Updated"),
                        Err(e) => warn!(entity_type, error = %e, "Update rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Delete { filter, respond_to } => {
                    debug!(entity_type, ?filter, "Delete");
                    let before = self.rows.len();
                    self.rows.retain(|_, row| !row.matches(&filter));
                    let removed = before - self.rows.len();
                    info!(entity_type, removed, size = self.rows.len(), "Deleted");
                    let _ = respond_to.send(Ok(removed));
                }
                StoreRequest::GetOrInsert {
                    filter,
                    row,
                    respond_to,
                } => {
                    if let Some(existing) = self.rows.values().find(|r| r.matches(&filter)) {
                        debug!(entity_type, ?filter, "GetOrInsert hit");
                        let _ = respond_to.send(Ok((existing.clone(), false)));
                        continue;
                    }
                    let result = self
                        .insert_rows(vec![row])
                        .map(|mut rows| (rows.remove(0), true));
                    match &result {
                        Ok(_) => info!(entity_type, size = self.rows.len(), "GetOrInsert created"),
                        Err(e) => warn!(entity_type, error = %e, "GetOrInsert failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, size = self.rows.len(), "Shutdown");
    }
}
