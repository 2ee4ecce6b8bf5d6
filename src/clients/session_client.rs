use crate::clients::single;
use crate::error::Error;
use crate::model::{BillSession, NewSession, SessionFilter, SessionId, SessionPatch};
use tracing::{debug, instrument};

record_client!(
    /// Client for the bill session records.
    SessionClient,
    BillSession,
    "session"
);

impl SessionClient {
    /// Returns the table's active session, opening one from `new` if there is none.
    /// The flag is `true` when this call created it.
    #[instrument(skip(self))]
    pub async fn open_for_table(&self, new: NewSession) -> Result<(BillSession, bool), Error> {
        debug!("Sending request");
        Ok(self
            .inner
            .get_or_insert(SessionFilter::ActiveForTable(new.table_id), new)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn transition(&self, id: SessionId, patch: SessionPatch) -> Result<BillSession, Error> {
        debug!("Sending request");
        let rows = self.inner.update(SessionFilter::Id(id), patch).await?;
        single(rows, "session", id)
    }
}
