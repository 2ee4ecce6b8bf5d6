//! # Store Client
//!
//! This module defines the generic client for talking to a [`StoreActor`](crate::StoreActor).

use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::record::Record;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Deadline applied to each call unless [`StoreClient::with_deadline`] says otherwise.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// ## StoreClient
///
/// The `StoreClient<T>` is the typed, async handle on one record table. It forwards
/// requests over a Tokio mpsc channel and waits for the answer on a oneshot channel.
///
/// * **Cloneable** – holds only a sender and a deadline, so cloning is inexpensive.
/// * **Bounded** – every call is wrapped in `tokio::time::timeout`; a call that does not
///   answer in time fails with [`StoreError::Timeout`] instead of hanging the caller.
pub struct StoreClient<T: Record> {
    sender: mpsc::Sender<StoreRequest<T>>,
    deadline: Duration,
}

impl<T: Record> Clone for StoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            deadline: self.deadline,
        }
    }
}

impl<T: Record> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self {
            sender,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Returns a copy of this client whose calls give up after `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<R, StoreError>>) -> StoreRequest<T>,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(build(respond_to))
                .await
                .map_err(|_| StoreError::Closed)?;
            response.await.map_err(|_| StoreError::Dropped)?
        };
        bounded(self.deadline, exchange).await
    }

    pub async fn insert(&self, rows: Vec<T::New>) -> Result<Vec<T>, StoreError> {
        self.call(|respond_to| StoreRequest::Insert { rows, respond_to })
            .await
    }

    /// Inserts a single row and returns it.
    pub async fn insert_one(&self, row: T::New) -> Result<T, StoreError> {
        let mut rows = self.insert(vec![row]).await?;
        rows.pop()
            .ok_or_else(|| StoreError::Unavailable("insert returned no row".to_string()))
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.call(|respond_to| StoreRequest::Get { id, respond_to })
            .await
    }

    pub async fn select(&self, filter: T::Filter) -> Result<Vec<T>, StoreError> {
        self.call(|respond_to| StoreRequest::Select { filter, respond_to })
            .await
    }

    /// First row matching `filter`, or `None` when nothing matches.
    pub async fn find_one(&self, filter: T::Filter) -> Result<Option<T>, StoreError> {
        Ok(self.select(filter).await?.into_iter().next())
    }

    pub async fn update(&self, filter: T::Filter, patch: T::Patch) -> Result<Vec<T>, StoreError> {
        self.call(|respond_to| StoreRequest::Update {
            filter,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, filter: T::Filter) -> Result<usize, StoreError> {
        self.call(|respond_to| StoreRequest::Delete { filter, respond_to })
            .await
    }

    /// Returns the first row matching `filter`, inserting `row` if there is none.
    /// The boolean is `true` when the row was created by this call.
    pub async fn get_or_insert(
        &self,
        filter: T::Filter,
        row: T::New,
    ) -> Result<(T, bool), StoreError> {
        self.call(|respond_to| StoreRequest::GetOrInsert {
            filter,
            row,
            respond_to,
        })
        .await
    }
}

/// Runs `fut` with an upper bound of `deadline`.
pub async fn bounded<R>(
    deadline: Duration,
    fut: impl Future<Output = Result<R, StoreError>>,
) -> Result<R, StoreError> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| StoreError::Timeout(deadline))?
}
