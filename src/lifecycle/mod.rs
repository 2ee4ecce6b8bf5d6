//! # System Lifecycle
//!
//! [`RestaurantSystem`] is the one place that knows how the pieces fit together:
//!
//! 1. **Store actors** - one [`StoreActor`](record_store::StoreActor) per record table,
//!    each spawned on its own task.
//! 2. **Services** - registry, sessions, billing, intake and kitchen, wired with clones of
//!    the store clients they need.
//! 3. **Pollers** - the table and order poll loops, started on demand and stopped with a
//!    `CancellationToken`.
//!
//! ## Graceful Shutdown
//!
//! 1. Cancel the pollers and wait for them.
//! 2. Drop every service, which drops the last store clients.
//! 3. Each actor sees its channel close, logs its final size and exits.
//! 4. Await the actor tasks.
//!
//! Anything still holding a service clone keeps its actors alive, so drop those before
//! calling [`RestaurantSystem::shutdown`].

pub mod restaurant;
pub mod tracing;

pub use self::restaurant::*;
pub use self::tracing::*;
