//! # Store Messages
//!
//! Requests sent from a [`StoreClient`](crate::StoreClient) to its
//! [`StoreActor`](crate::StoreActor), each carrying a oneshot channel for the answer.

use crate::error::StoreError;
use crate::record::Record;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by store actors.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// A single request against one record table.
///
/// The variants mirror the operations of a generic record store: insert, point read,
/// filtered select, filtered update with a patch, filtered delete, plus `GetOrInsert`,
/// which the actor runs as one step so two concurrent "get or create" calls can never
/// both insert.
#[derive(Debug)]
pub enum StoreRequest<T: Record> {
    Insert {
        rows: Vec<T::New>,
        respond_to: Response<Vec<T>>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Select {
        filter: T::Filter,
        respond_to: Response<Vec<T>>,
    },
    Update {
        filter: T::Filter,
        patch: T::Patch,
        respond_to: Response<Vec<T>>,
    },
    Delete {
        filter: T::Filter,
        respond_to: Response<usize>,
    },
    GetOrInsert {
        filter: T::Filter,
        row: T::New,
        respond_to: Response<(T, bool)>,
    },
}
