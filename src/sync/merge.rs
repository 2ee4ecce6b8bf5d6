//! Reconciliation of a polled collection with the local, optimistically updated one.

use crate::model::Table;
use crate::sync::{OrderView, SyncKey};
use std::collections::BTreeSet;

/// A row that belongs to exactly one suppression key.
pub trait Keyed {
    fn sync_key(&self) -> SyncKey;
}

impl Keyed for Table {
    fn sync_key(&self) -> SyncKey {
        SyncKey::Table(self.id)
    }
}

impl Keyed for OrderView {
    fn sync_key(&self) -> SyncKey {
        SyncKey::Order(self.order.id)
    }
}

/// Returns the collection observers should see after a poll.
///
/// The remote rows win, except for suppressed keys: for those the local row is kept in
/// place of the remote one, and kept even if the poll did not return it at all. Rows that
/// are neither remote nor suppressed disappear.
pub fn merge<T: Keyed + Clone>(local: &[T], remote: Vec<T>, suppressed: &BTreeSet<SyncKey>) -> Vec<T> {
    let local_for = |key: SyncKey| local.iter().find(|row| row.sync_key() == key);

    let mut seen = BTreeSet::new();
    let mut merged: Vec<T> = remote
        .into_iter()
        .map(|row| {
            let key = row.sync_key();
            seen.insert(key);
            match local_for(key) {
                Some(kept) if suppressed.contains(&key) => kept.clone(),
                _ => row,
            }
        })
        .collect();

    merged.extend(
        local
            .iter()
            .filter(|row| {
                let key = row.sync_key();
                suppressed.contains(&key) && !seen.contains(&key)
            })
            .cloned(),
    );
    merged
}
