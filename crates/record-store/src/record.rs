//! # Record Trait
//!
//! The `Record` trait is the contract every stored row type (Table, Session, Order, …)
//! implements so that a generic [`StoreActor`](crate::StoreActor) can own a table of them.
//! It names the associated types for ids, insert payloads, filters and patches, and the
//! three hooks the actor calls: [`Record::from_insert`], [`Record::matches`] and
//! [`Record::apply_patch`].
//!
//! # Validation
//! Hooks return `Result<_, Self::Error>`. The actor validates a whole request before it
//! writes anything, so a rejected insert or patch leaves the table untouched.

use std::fmt::{Debug, Display};

/// A row type that can be held by a [`StoreActor`](crate::StoreActor).
///
/// # Associated Types
/// `New`, `Filter` and `Patch` are the typed equivalents of an insert body, a `WHERE`
/// clause and an `UPDATE ... SET` body. A `Table` row only accepts a `TableFilter`, so a
/// query can never be aimed at the wrong table.
///
/// # Ids
/// `Id` must be convertible from `u32` (the actor hands out sequential ids) and `Ord` so
/// selections come back in insertion order.
pub trait Record: Clone + Send + Sync + 'static {
    /// Primary key of the row.
    type Id: Ord + Clone + Send + Sync + Display + Debug + From<u32>;

    /// Payload accepted by `insert`.
    type New: Send + Sync + Debug;

    /// Row predicate accepted by `select`, `update` and `delete`.
    type Filter: Send + Sync + Debug;

    /// Partial update accepted by `update`.
    type Patch: Send + Sync + Debug;

    /// Record-level validation failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the stored row from its freshly assigned id and the insert payload.
    fn from_insert(id: Self::Id, new: Self::New) -> Result<Self, Self::Error>;

    /// Whether this row is selected by `filter`.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Applies `patch` in place. Called on a copy first, so an `Err` never leaves a
    /// half-written row behind.
    fn apply_patch(&mut self, patch: &Self::Patch) -> Result<(), Self::Error>;
}
