//! # Record Store
//!
//! An in-process record store built from one actor per record table. Each table is a
//! [`StoreActor`] task that owns its rows; callers talk to it through a cloneable,
//! typed [`StoreClient`]. The surface is deliberately that of a plain key/filter store:
//!
//! - `insert(rows)`, `get(id)`, `select(filter)`, `update(filter, patch)`, `delete(filter)`
//! - `get_or_insert(filter, row)`, the one conditional write, atomic within its table
//!
//! There are **no transactions across tables**. A workflow that touches a session, an
//! order and a bill issues three independent writes, and each either happened or it did
//! not. That is the property the orchestration layer above this crate is written against.
//!
//! ## Architecture Overview
//!
//! 1. **Record Layer** ([`Record`]) - the row type plus its insert payload, filter and patch
//! 2. **Runtime Layer** ([`StoreActor`]) - sequential request processing per table
//! 3. **Interface Layer** ([`StoreClient`], [`RecordClient`]) - typed, deadline-bounded calls
//!
//! ## Example
//!
//! ```rust
//! use record_store::{Record, StoreActor};
//!
//! #[derive(Clone, Debug)]
//! struct Seat { id: u32, taken: bool }
//! #[derive(Debug)] struct NewSeat;
//! #[derive(Debug)] enum SeatFilter { Free }
//! #[derive(Debug)] struct Take;
//! #[derive(Debug, thiserror::Error)] #[error("seat already taken")] struct Taken;
//!
//! impl Record for Seat {
//!     type Id = u32; type New = NewSeat; type Filter = SeatFilter; type Patch = Take; type Error = Taken;
//!     fn from_insert(id: u32, _: NewSeat) -> Result<Self, Taken> { Ok(Self { id, taken: false }) }
//!     fn matches(&self, filter: &SeatFilter) -> bool { match filter { SeatFilter::Free => !self.taken } }
//!     fn apply_patch(&mut self, _: &Take) -> Result<(), Taken> {
//!         if self.taken { return Err(Taken); }
//!         self.taken = true;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, seats) = StoreActor::<Seat>::new(10);
//!     tokio::spawn(actor.run());
//!
//!     seats.insert(vec![NewSeat, NewSeat]).await.unwrap();
//!     let taken = seats.update(SeatFilter::Free, Take).await.unwrap();
//!     assert_eq!(taken.len(), 2);
//!     assert!(seats.select(SeatFilter::Free).await.unwrap().is_empty());
//! }
//! ```
//!
//! ## Testing
//!
//! The [`mock`] module scripts a table's answers so a single table can be made to fail
//! while the rest of a workflow runs against real actors.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod error;
pub mod message;
pub mod mock;
pub mod record;

// Re-export core types for convenience
pub use actor::StoreActor;
pub use client::{bounded, StoreClient, DEFAULT_DEADLINE};
pub use client_trait::RecordClient;
pub use error::StoreError;
pub use message::{Response, StoreRequest};
pub use record::Record;
