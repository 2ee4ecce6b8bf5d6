//! # RecordClient Trait
//!
//! Provides a common interface for table-specific clients, adding default `get`, `select`
//! and `find_one` methods built on top of a generic `StoreClient`.
use crate::{Record, StoreClient, StoreError};
use async_trait::async_trait;

/// Trait for table-specific clients to inherit the standard read operations.
///
/// Implementors only say where their `StoreClient` is and how a [`StoreError`] becomes
/// their own error type; the reads come for free.
///
/// # Example
///
/// ```rust
/// use record_store::{Record, RecordClient, StoreClient, StoreError};
///
/// #[derive(Clone, Debug)]
/// struct Dish { id: u32, name: String }
/// #[derive(Debug)] struct NewDish { name: String }
/// #[derive(Debug)] enum DishFilter { Name(String) }
/// #[derive(Debug)] struct Rename(String);
/// #[derive(Debug, thiserror::Error)] #[error("dish error")] struct DishError;
///
/// impl Record for Dish {
///     type Id = u32;
///     type New = NewDish;
///     type Filter = DishFilter;
///     type Patch = Rename;
///     type Error = DishError;
///     fn from_insert(id: u32, new: NewDish) -> Result<Self, DishError> {
///         Ok(Self { id, name: new.name })
///     }
///     fn matches(&self, filter: &DishFilter) -> bool {
///         match filter { DishFilter::Name(n) => &self.name == n }
///     }
///     fn apply_patch(&mut self, patch: &Rename) -> Result<(), DishError> {
///         self.name = patch.0.clone();
///         Ok(())
///     }
/// }
///
/// #[derive(Debug)] struct MenuError(String);
/// impl From<String> for MenuError { fn from(s: String) -> Self { MenuError(s) } }
///
/// struct DishClient { inner: StoreClient<Dish> }
///
/// impl RecordClient<Dish> for DishClient {
///     type Error = MenuError;
///     fn inner(&self) -> &StoreClient<Dish> { &self.inner }
///     fn map_error(e: StoreError) -> MenuError { MenuError(e.to_string()) }
/// }
///
/// async fn usage(client: DishClient) {
///     // get(), select() and find_one() are provided automatically
///     let _ = client.find_one(DishFilter::Name("Soup".into())).await;
/// }
/// ```
#[async_trait]
pub trait RecordClient<T: Record>: Send + Sync {
    /// The caller-facing error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic StoreClient.
    fn inner(&self) -> &StoreClient<T>;

    /// Map store errors to the caller-facing error type.
    fn map_error(e: StoreError) -> Self::Error;

    /// Fetch a row by id.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every row matching `filter`.
    #[tracing::instrument(skip(self))]
    async fn select(&self, filter: T::Filter) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().select(filter).await.map_err(Self::map_error)
    }

    /// Fetch the first row matching `filter`.
    #[tracing::instrument(skip(self))]
    async fn find_one(&self, filter: T::Filter) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().find_one(filter).await.map_err(Self::map_error)
    }
}
