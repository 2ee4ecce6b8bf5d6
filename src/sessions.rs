//! # Session Manager
//!
//! A [`BillSession`] covers one seating of a table, `active` until the party pays
//! (`closed`) or leaves without ordering (`cancelled`). Orders and the session bill hang
//! off it.
//!
//! At most one session per table is active. The store enforces that by answering
//! "get the active session, or open this one" in a single request.

use crate::clients::SessionClient;
use crate::clock::Clock;
use crate::error::Error;
use crate::model::{
    BillSession, NewSession, Occupancy, SessionFilter, SessionId, SessionPatch, TableId,
};
use crate::registry::TableRegistry;
use crate::saga::{SagaLog, Step};
use record_store::RecordClient;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct SessionManager {
    sessions: SessionClient,
    registry: TableRegistry,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(sessions: SessionClient, registry: TableRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions,
            registry,
            clock,
        }
    }

    /// Seats a party at a table.
    ///
    /// Idempotent: while the table has an active session that session is returned and
    /// nothing is written. The session row is created before the table is flipped to
    /// occupied, so an interruption leaves an active session on a table that still reads
    /// available, which the next call repairs.
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        table_id: TableId,
        guest_label: &str,
        party_size: u32,
    ) -> Result<BillSession, Error> {
        let table = self.registry.require(table_id).await?;
        let mut log = SagaLog::new("start_session");

        let (session, created) = log.critical(
            Step::OpenSession,
            self.sessions
                .open_for_table(NewSession {
                    table_id,
                    party_size,
                    guest_label: guest_label.to_string(),
                    opened_at: self.clock.now(),
                })
                .await,
        )?;

        if created || table.session_id != Some(session.id) {
            let occupancy = Occupancy::Occupied {
                occupant: Some(session.guest_label.clone()),
                session_id: session.id,
            };
            log.critical(
                Step::OccupyTable,
                self.registry.set_occupancy(table_id, occupancy).await,
            )?;
        }

        info!(session = %session.id, %table_id, created, "Session started");
        Ok(session)
    }

    /// The table's active session; `None` is a normal answer.
    pub async fn get_active_session(&self, table_id: TableId) -> Result<Option<BillSession>, Error> {
        self.sessions
            .find_one(SessionFilter::ActiveForTable(table_id))
            .await
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<Option<BillSession>, Error> {
        self.sessions.get(session_id).await
    }

    /// Closes the table's active session and releases the table.
    #[instrument(skip(self))]
    pub async fn close_session(&self, table_id: TableId) -> Result<BillSession, Error> {
        self.end_session(table_id, SessionPatch::Close { at: self.clock.now() })
            .await
    }

    /// Cancels the table's active session and releases the table. Fails with
    /// `NoActiveSession` when there is nothing to cancel.
    #[instrument(skip(self))]
    pub async fn cancel_session(&self, table_id: TableId) -> Result<BillSession, Error> {
        self.end_session(table_id, SessionPatch::Cancel { at: self.clock.now() })
            .await
    }

    async fn end_session(&self, table_id: TableId, patch: SessionPatch) -> Result<BillSession, Error> {
        let active = self
            .get_active_session(table_id)
            .await?
            .ok_or(Error::NoActiveSession(table_id))?;
        let session = self.sessions.transition(active.id, patch).await?;
        self.registry
            .set_occupancy(table_id, Occupancy::Available)
            .await?;
        info!(session = %session.id, status = %session.status, "Session ended");
        Ok(session)
    }

    /// Closes a session without touching its table. Closing an already terminal session
    /// returns it unchanged, so a re-driven payment does not fail here.
    pub(crate) async fn close_session_record(&self, session_id: SessionId) -> Result<BillSession, Error> {
        let session = self.sessions.require(session_id).await?;
        if session.status.is_terminal() {
            return Ok(session);
        }
        self.sessions
            .transition(session_id, SessionPatch::Close { at: self.clock.now() })
            .await
    }
}
