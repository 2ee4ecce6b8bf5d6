//! # Dine-in Orchestrator
//!
//! > **Seat a table, take the order, run it through the kitchen, bill it, free the table.**
//!
//! Each of those steps is a plain record write. What this crate adds is the sequencing
//! between them: five loosely coupled records (table, session, order, order item, bill)
//! move through correlated state machines on a store that has no multi-record
//! transactions, while observers only see the store through polling plus local
//! optimistic updates.
//!
//! ## 🏗️ Design
//!
//! ### Forward-only sagas
//! Every workflow (`start_session`, `place_order`, `advance_item`, `pay_and_close`) runs
//! its steps in order and never rolls back. Which steps may fail without failing the
//! workflow is a table in [`saga::Step::criticality`]; the caller gets a
//! [`saga::SagaOutcome`] that carries the warnings next to the result.
//!
//! ### One actor per record table
//! The store is [`record_store`]: each table is an actor task processing its requests one
//! at a time, which makes "get the active session or open one" atomic without locks.
//!
//! ### Optimistic views
//! [`sync::SyncLayer`] owns the table list and the kitchen board that observers watch.
//! Local writes land there immediately and hold off the pollers for a cool-down.
//!
//! ## 🗺️ Module Tour
//!
//! | module | role |
//! |---|---|
//! | [`registry`] | table occupancy |
//! | [`sessions`] | one active bill session per table |
//! | [`intake`] | carts into orders and items, linked to the session bill |
//! | [`kitchen`] | `in-kitchen → wait → ready → served` with ready and served side effects |
//! | [`billing`] | bill totals, pay-and-close, refunds, statistics |
//! | [`sync`] | polling, suppression windows, merge |
//! | [`lifecycle`] | wiring, shutdown, tracing |
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod billing;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod intake;
pub mod kitchen;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod registry;
pub mod saga;
pub mod sessions;
pub mod sync;

pub use error::Error;
pub use lifecycle::RestaurantSystem;
