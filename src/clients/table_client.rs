use crate::clients::single;
use crate::error::Error;
use crate::model::{NewTable, Occupancy, Table, TableFilter, TableId, TablePatch};
use tracing::{debug, instrument};

record_client!(
    /// Client for the table records.
    TableClient,
    Table,
    "table"
);

impl TableClient {
    #[instrument(skip(self))]
    pub async fn set_occupancy(&self, id: TableId, occupancy: Occupancy) -> Result<Table, Error> {
        debug!("Sending request");
        let rows = self
            .inner
            .update(TableFilter::Id(id), TablePatch::Occupancy(occupancy))
            .await?;
        single(rows, "table", id)
    }

    #[instrument(skip(self))]
    pub async fn seed(&self, tables: Vec<NewTable>) -> Result<Vec<Table>, Error> {
        debug!("Sending request");
        Ok(self.inner.insert(tables).await?)
    }
}
