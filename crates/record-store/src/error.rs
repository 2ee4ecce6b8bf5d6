//! # Store Errors
//!
//! Errors surfaced by a [`StoreClient`](crate::StoreClient). "No matching row" is never an
//! error: `get` answers `Ok(None)` and `select`/`update` answer an empty vector.

use std::time::Duration;

/// Errors that can occur while talking to a record table.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store actor closed")]
    Closed,
    #[error("Store actor dropped response channel")]
    Dropped,
    #[error("Store call exceeded deadline of {0:?}")]
    Timeout(Duration),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Record rejected: {0}")]
    Rejected(Box<dyn std::error::Error + Send + Sync>),
}
