//! Typed wrappers around [`StoreClient`](record_store::StoreClient).
//!
//! Every client gets the standard reads from [`RecordClient`](record_store::RecordClient)
//! plus `require`, which turns a missing row into [`Error::NotFound`](crate::error::Error).
//! Writes that mean something in the domain (occupying a table, settling a bill) are
//! named methods on the individual clients.

macro_rules! record_client {
    ($(#[$meta:meta])* $client:ident, $record:ty, $entity:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $client {
            inner: record_store::StoreClient<$record>,
        }

        impl $client {
            pub fn new(inner: record_store::StoreClient<$record>) -> Self {
                Self { inner }
            }

            /// Fetches the row, failing with `NotFound` when it does not exist.
            pub async fn require(
                &self,
                id: <$record as record_store::Record>::Id,
            ) -> Result<$record, $crate::error::Error> {
                record_store::RecordClient::get(self, id)
                    .await?
                    .ok_or_else(|| $crate::error::Error::not_found($entity, id))
            }
        }

        #[async_trait::async_trait]
        impl record_store::RecordClient<$record> for $client {
            type Error = $crate::error::Error;

            fn inner(&self) -> &record_store::StoreClient<$record> {
                &self.inner
            }

            fn map_error(e: record_store::StoreError) -> Self::Error {
                $crate::error::Error::from(e)
            }
        }
    };
}

pub mod bill_client;
pub mod order_client;
pub mod session_client;
pub mod table_client;

pub use bill_client::*;
pub use order_client::*;
pub use session_client::*;
pub use table_client::*;

/// One client per record table.
#[derive(Clone)]
pub struct Stores {
    pub tables: TableClient,
    pub sessions: SessionClient,
    pub orders: OrderClient,
    pub items: OrderItemClient,
    pub bills: BillClient,
    pub payments: PaymentClient,
}

/// Takes the single row an id-filtered update touched, or reports the id as missing.
pub(crate) fn single<T>(
    rows: Vec<T>,
    entity: &'static str,
    id: impl std::fmt::Display,
) -> Result<T, crate::error::Error> {
    rows.into_iter()
        .next()
        .ok_or_else(|| crate::error::Error::not_found(entity, id))
}
