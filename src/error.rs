use crate::model::{RecordViolation, TableId};
use crate::notify::NotifyError;
use record_store::StoreError;
use std::fmt::Display;
use thiserror::Error;

/// Errors surfaced by the orchestration services.
///
/// A service returning `Err` means the operation did not happen. Side effects that failed
/// while the operation itself succeeded are reported as
/// [`PartialFailure`](crate::saga::PartialFailure) warnings instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("No active session for {0}")]
    NoActiveSession(TableId),

    #[error("Order creation failed: {0}")]
    OrderCreationFailed(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Rejected: {0}")]
    Rejected(#[from] RecordViolation),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(from: impl Display, to: impl Display) -> Self {
        Error::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            // Surface record validation as a domain error rather than a transport one.
            StoreError::Rejected(source) => match source.downcast::<RecordViolation>() {
                Ok(violation) => match *violation {
                    RecordViolation::ItemTransition { from, to } => {
                        Error::invalid_transition(from, to)
                    }
                    other => Error::Rejected(other),
                },
                Err(source) => Error::Store(StoreError::Rejected(source)),
            },
            other => Error::Store(other),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Store(StoreError::Unavailable(s))
    }
}
