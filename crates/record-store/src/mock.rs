//! # Mock Store & Failure Injection
//!
//! `MockStore<T>` hands out a real [`StoreClient<T>`] whose requests are answered from a
//! queue of expectations instead of a table. Code under test cannot tell the difference,
//! which makes it the easiest way to make one table fail while the others behave.
//!
//! ## When to use Mocks vs Real Actors
//!
//! | Feature | MockStore | Real StoreActor |
//! |---------|-----------|-----------------|
//! | **State** | None, answers are scripted | Real rows |
//! | **Error Injection** | Easy (`return_err`) | Hard |
//! | **Use Case** | One misbehaving table in a saga | Everything else |
//!
//! ```rust
//! use record_store::mock::MockStore;
//! use record_store::{Record, StoreError};
//!
//! #[derive(Clone, Debug)] struct Row { id: u32 }
//! #[derive(Debug, thiserror::Error)] #[error("row")] struct RowError;
//! impl Record for Row {
//!     type Id = u32; type New = (); type Filter = (); type Patch = (); type Error = RowError;
//!     fn from_insert(id: u32, _: ()) -> Result<Self, RowError> { Ok(Self { id }) }
//!     fn matches(&self, _: &()) -> bool { true }
//!     fn apply_patch(&mut self, _: &()) -> Result<(), RowError> { Ok(()) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockStore::<Row>::new();
//!     mock.expect_select().return_err(StoreError::Unavailable("disk full".into()));
//!
//!     let result = mock.client().select(()).await;
//!     assert!(matches!(result, Err(StoreError::Unavailable(_))));
//!     mock.verify();
//! }
//! ```

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::record::Record;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Represents an expected request to the mock store.
enum Expectation<T: Record> {
    Insert(Result<Vec<T>, StoreError>),
    Get(Result<Option<T>, StoreError>),
    Select(Result<Vec<T>, StoreError>),
    Update(Result<Vec<T>, StoreError>),
    Delete(Result<usize, StoreError>),
    GetOrInsert(Result<(T, bool), StoreError>),
}

impl<T: Record> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Insert(_) => "insert",
            Expectation::Get(_) => "get",
            Expectation::Select(_) => "select",
            Expectation::Update(_) => "update",
            Expectation::Delete(_) => "delete",
            Expectation::GetOrInsert(_) => "get_or_insert",
        }
    }
}

fn request_name<T: Record>(request: &StoreRequest<T>) -> &'static str {
    match request {
        StoreRequest::Insert { .. } => "insert",
        StoreRequest::Get { .. } => "get",
        StoreRequest::Select { .. } => "select",
        StoreRequest::Update { .. } => "update",
        StoreRequest::Delete { .. } => "delete",
        StoreRequest::GetOrInsert { .. } => "get_or_insert",
    }
}

/// A scripted record table.
///
/// # Example
/// ```ignore
/// let mut mock = MockStore::<BillSession>::new();
/// mock.expect_select().return_ok(vec![session]);
/// mock.expect_update().return_err(StoreError::Unavailable("timeout".into()));
///
/// let sessions = mock.client();
/// // Use the client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockStore<T: Record> {
    client: StoreClient<T>,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: Record> Default for MockStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MockStore<T> {
    /// Creates a new mock store with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest<T>>(100);
        let expectations = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        // Spawn background task to answer requests
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone.lock().unwrap().pop_front();

                match (request, expectation) {
                    (StoreRequest::Insert { respond_to, .. }, Some(Expectation::Insert(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::Get { respond_to, .. }, Some(Expectation::Get(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::Select { respond_to, .. }, Some(Expectation::Select(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::Update { respond_to, .. }, Some(Expectation::Update(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::Delete { respond_to, .. }, Some(Expectation::Delete(response))) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        StoreRequest::GetOrInsert { respond_to, .. },
                        Some(Expectation::GetOrInsert(response)),
                    ) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        panic!(
                            "Unexpected {} request, expected {}",
                            request_name(&request),
                            expectation.as_ref().map_or("nothing", Expectation::name)
                        );
                    }
                }
            }
        });

        Self {
            client: StoreClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> StoreClient<T> {
        self.client.clone()
    }

    pub fn expect_insert(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expectation::Insert)
    }

    pub fn expect_get(&mut self) -> ExpectationBuilder<T, Option<T>> {
        self.builder(Expectation::Get)
    }

    pub fn expect_select(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expectation::Select)
    }

    pub fn expect_update(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expectation::Update)
    }

    pub fn expect_delete(&mut self) -> ExpectationBuilder<T, usize> {
        self.builder(Expectation::Delete)
    }

    pub fn expect_get_or_insert(&mut self) -> ExpectationBuilder<T, (T, bool)> {
        self.builder(Expectation::GetOrInsert)
    }

    fn builder<R>(
        &self,
        wrap: fn(Result<R, StoreError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            wrap,
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

/// Builder that queues the answer for one expected request.
pub struct ExpectationBuilder<T: Record, R> {
    wrap: fn(Result<R, StoreError>) -> Expectation<T>,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
}

impl<T: Record, R> ExpectationBuilder<T, R> {
    /// Answers the request successfully with `value`.
    pub fn return_ok(self, value: R) {
        self.expectations
            .lock()
            .unwrap()
            .push_back((self.wrap)(Ok(value)));
    }

    /// Answers the request with `error`.
    pub fn return_err(self, error: StoreError) {
        self.expectations
            .lock()
            .unwrap()
            .push_back((self.wrap)(Err(error)));
    }
}

// =============================================================================
// CHANNEL-LEVEL HELPERS
// =============================================================================

/// Creates a client and the raw receiver its requests arrive on, for tests that want to
/// inspect the request itself (filters, patches) before answering.
pub fn create_mock_store<T: Record>(
    buffer_size: usize,
) -> (StoreClient<T>, mpsc::Receiver<StoreRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Record>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(
    T::Filter,
    T::Patch,
    tokio::sync::oneshot::Sender<Result<Vec<T>, StoreError>>,
)> {
    match receiver.recv().await {
        Some(StoreRequest::Update {
            filter,
            patch,
            respond_to,
        }) => Some((filter, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Select request
pub async fn expect_select<T: Record>(
    receiver: &mut mpsc::Receiver<StoreRequest<T>>,
) -> Option<(
    T::Filter,
    tokio::sync::oneshot::Sender<Result<Vec<T>, StoreError>>,
)> {
    match receiver.recv().await {
        Some(StoreRequest::Select { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}
