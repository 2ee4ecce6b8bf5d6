use crate::billing::BillingEngine;
use crate::clients::{
    BillClient, OrderClient, OrderItemClient, PaymentClient, SessionClient, Stores, TableClient,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::intake::OrderIntake;
use crate::kitchen::KitchenPipeline;
use crate::notify::{LogNotifier, Notifier};
use crate::registry::TableRegistry;
use crate::sessions::SessionManager;
use crate::sync::{spawn_pollers, SyncLayer};
use record_store::{Record, StoreActor, StoreClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Everything one front-of-house terminal runs.
///
/// # Example
///
/// ```ignore
/// let system = RestaurantSystem::new(Config::default(), Arc::new(SystemClock), Arc::new(LogNotifier));
///
/// let session = system.sessions.start_session(table_id, "Rossi", 2).await?;
/// let placed = system.intake.place_order(table_id, cart, "Rossi", "Marco").await?;
///
/// system.shutdown().await?;
/// ```
pub struct RestaurantSystem {
    pub registry: TableRegistry,
    pub sessions: SessionManager,
    pub intake: OrderIntake,
    pub kitchen: KitchenPipeline,
    pub billing: BillingEngine,
    pub sync: SyncLayer,
    stores: Stores,
    config: Config,
    shutdown_token: CancellationToken,
    /// Store actor tasks
    handles: Vec<JoinHandle<()>>,
    pollers: Vec<JoinHandle<()>>,
}

impl RestaurantSystem {
    /// Spawns every store actor and wires the services. Must be called inside a Tokio
    /// runtime. The pollers are not started; see [`start_polling`](Self::start_polling).
    pub fn new(config: Config, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        let mut handles = Vec::new();
        let buffer = config.channel_buffer;
        let deadline = config.store_deadline;

        let stores = Stores {
            tables: TableClient::new(spawn_store(buffer, deadline, &mut handles)),
            sessions: SessionClient::new(spawn_store(buffer, deadline, &mut handles)),
            orders: OrderClient::new(spawn_store(buffer, deadline, &mut handles)),
            items: OrderItemClient::new(spawn_store(buffer, deadline, &mut handles)),
            bills: BillClient::new(spawn_store(buffer, deadline, &mut handles)),
            payments: PaymentClient::new(spawn_store(buffer, deadline, &mut handles)),
        };

        Self::wire(config, stores, clock, notifier, handles)
    }

    /// Wires the services on top of existing store clients, e.g. a mix of real actors and
    /// [`MockStore`](record_store::mock::MockStore)s in tests.
    pub fn from_stores(
        config: Config,
        stores: Stores,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::wire(config, stores, clock, notifier, Vec::new())
    }

    /// Default configuration, wall clock, notifications to the log.
    pub fn with_defaults() -> Self {
        Self::new(Config::default(), Arc::new(SystemClock), Arc::new(LogNotifier))
    }

    fn wire(
        config: Config,
        stores: Stores,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        handles: Vec<JoinHandle<()>>,
    ) -> Self {
        let sync = SyncLayer::new(
            stores.tables.clone(),
            stores.orders.clone(),
            stores.items.clone(),
            config.suppression_window,
            clock.clone(),
        );
        let registry = TableRegistry::new(stores.tables.clone(), sync.clone());
        let sessions = SessionManager::new(stores.sessions.clone(), registry.clone(), clock.clone());
        let billing = BillingEngine::new(
            stores.bills.clone(),
            stores.payments.clone(),
            stores.orders.clone(),
            stores.items.clone(),
            sessions.clone(),
            registry.clone(),
            clock.clone(),
            config.tax_rate,
        );
        let intake = OrderIntake::new(
            stores.orders.clone(),
            stores.items.clone(),
            registry.clone(),
            sessions.clone(),
            billing.clone(),
            notifier.clone(),
            clock,
            config.notify_deadline,
        );
        let kitchen = KitchenPipeline::new(
            stores.orders.clone(),
            stores.items.clone(),
            billing.clone(),
            sync.clone(),
            notifier,
            config.notify_deadline,
        );

        info!(actors = handles.len(), "Restaurant system started");
        Self {
            registry,
            sessions,
            intake,
            kitchen,
            billing,
            sync,
            stores,
            config,
            shutdown_token: CancellationToken::new(),
            handles,
            pollers: Vec::new(),
        }
    }

    /// Direct access to the record tables.
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts the table and order poll loops. Calling it again does nothing.
    pub fn start_polling(&mut self) {
        if !self.pollers.is_empty() {
            return;
        }
        self.pollers = spawn_pollers(
            self.sync.clone(),
            self.config.table_poll_interval,
            self.config.order_poll_interval,
            self.shutdown_token.clone(),
        );
    }

    /// Stops the pollers, closes every store and waits for the actors to finish.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if every task finished cleanly
    /// - `Err(String)` if a task panicked
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down restaurant system...");
        let Self {
            registry,
            sessions,
            intake,
            kitchen,
            billing,
            sync,
            stores,
            shutdown_token,
            handles,
            pollers,
            ..
        } = self;

        shutdown_token.cancel();
        for poller in pollers {
            if let Err(e) = poller.await {
                error!("Poller task failed: {:?}", e);
                return Err(format!("Poller task failed: {:?}", e));
            }
        }

        // Dropping the last clients closes the actors' channels.
        drop((intake, kitchen, billing, sessions, registry, sync, stores));

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Restaurant system shutdown complete.");
        Ok(())
    }
}

fn spawn_store<T: Record>(
    buffer: usize,
    deadline: Duration,
    handles: &mut Vec<JoinHandle<()>>,
) -> StoreClient<T> {
    let (actor, client) = StoreActor::<T>::new(buffer);
    handles.push(tokio::spawn(actor.run()));
    client.with_deadline(deadline)
}
