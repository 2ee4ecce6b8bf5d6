//! # Observability & Tracing
//!
//! Every store actor logs with an `entity_type` field (`Table`, `Order`, `Bill`...), and
//! the services log saga steps with `saga` and `step` fields, so one dine-in visit reads
//! top to bottom in the log:
//!
//! ```text
//! INFO start_session: Session started session=session_1 table_id=table_5 created=true
//! INFO place_order: Order created order=order_1 table=5
//! WARN place_order: Auxiliary step failed saga="place_order" step=notify_new_order error=No subscribers listening
//! INFO advance_item: Item advanced item=item_2 status=served
//! INFO pay_and_close: Bill paid and table released bill=bill_1 total=295.00 table_id=table_5
//! ```
//!
//! `RUST_LOG` takes precedence; without it the configured default filter applies.
//!
//! ```bash
//! RUST_LOG=debug cargo run     # store requests with their filters and patches
//! ```

use tracing_subscriber::EnvFilter;

/// Installs the global compact subscriber. Call once, from `main`.
pub fn setup_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // entity_type and span names say where a line comes from
        .compact()
        .init();
}
