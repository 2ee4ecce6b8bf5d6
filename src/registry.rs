//! # Table Registry
//!
//! Occupancy of the physical tables. Every change goes through
//! [`TableRegistry::set_occupancy`], which updates the observed table list at once and
//! holds off the table poller until the store has caught up.

use crate::clients::TableClient;
use crate::error::Error;
use crate::model::{NewTable, Occupancy, Table, TableFilter, TableId};
use crate::sync::SyncLayer;
use record_store::RecordClient;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct TableRegistry {
    tables: TableClient,
    sync: SyncLayer,
}

impl TableRegistry {
    pub fn new(tables: TableClient, sync: SyncLayer) -> Self {
        Self { tables, sync }
    }

    /// Moves a table to `occupancy`.
    ///
    /// Releasing a table clears its occupant and session back-reference; occupying it sets
    /// both. Fails with `NotFound` when the table does not exist.
    #[instrument(skip(self))]
    pub async fn set_occupancy(&self, table_id: TableId, occupancy: Occupancy) -> Result<Table, Error> {
        let previous = self.sync.optimistic_table(table_id, &occupancy).await;
        match self.tables.set_occupancy(table_id, occupancy).await {
            Ok(table) => {
                info!(table = %table.id, status = %table.status, "Occupancy changed");
                self.sync.confirm_table(table.clone()).await;
                Ok(table)
            }
            Err(e) => {
                warn!(%table_id, error = %e, "Occupancy change failed");
                self.sync.rollback_table(table_id, previous).await;
                Err(e)
            }
        }
    }

    pub async fn get_table(&self, table_id: TableId) -> Result<Option<Table>, Error> {
        self.tables.get(table_id).await
    }

    pub async fn require(&self, table_id: TableId) -> Result<Table, Error> {
        self.tables.require(table_id).await
    }

    pub async fn find_by_number(&self, number: u32) -> Result<Option<Table>, Error> {
        self.tables.find_one(TableFilter::Number(number)).await
    }

    /// Creates the restaurant's tables, all available.
    #[instrument(skip(self, tables), fields(count = tables.len()))]
    pub async fn seed(&self, tables: Vec<NewTable>) -> Result<Vec<Table>, Error> {
        let created = self.tables.seed(tables).await?;
        for table in &created {
            self.sync.confirm_table(table.clone()).await;
        }
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Table>, Error> {
        self.tables.select(TableFilter::All).await
    }
}
