use crate::clients::single;
use crate::error::Error;
use crate::model::{
    Bill, BillFilter, BillId, BillPatch, NewBill, NewPayment, Payment, PaymentFilter, PaymentId,
    PaymentPatch, SettlementStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

record_client!(
    /// Client for the bill records.
    BillClient,
    Bill,
    "bill"
);

record_client!(
    /// Client for the payment records.
    PaymentClient,
    Payment,
    "payment"
);

impl BillClient {
    /// Returns the first bill matching `filter`, creating one from `new` if none does.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, filter: BillFilter, new: NewBill) -> Result<(Bill, bool), Error> {
        debug!("Sending request");
        Ok(self.inner.get_or_insert(filter, new).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_subtotal(
        &self,
        id: BillId,
        subtotal: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Bill, Error> {
        debug!("Sending request");
        let rows = self
            .inner
            .update(BillFilter::Id(id), BillPatch::Subtotal { subtotal, at })
            .await?;
        single(rows, "bill", id)
    }

    #[instrument(skip(self))]
    pub async fn settle(&self, id: BillId, at: DateTime<Utc>) -> Result<Bill, Error> {
        debug!("Sending request");
        let rows = self.inner.update(BillFilter::Id(id), BillPatch::Settle { at }).await?;
        single(rows, "bill", id)
    }

    #[instrument(skip(self))]
    pub async fn refund(&self, id: BillId, at: DateTime<Utc>) -> Result<Bill, Error> {
        debug!("Sending request");
        let rows = self.inner.update(BillFilter::Id(id), BillPatch::Refund { at }).await?;
        single(rows, "bill", id)
    }
}

impl PaymentClient {
    #[instrument(skip(self))]
    pub async fn open(&self, payment: NewPayment) -> Result<Payment, Error> {
        debug!("Sending request");
        Ok(self.inner.insert_one(payment).await?)
    }

    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        id: PaymentId,
        status: SettlementStatus,
        at: DateTime<Utc>,
    ) -> Result<Payment, Error> {
        debug!("Sending request");
        let rows = self
            .inner
            .update(PaymentFilter::Id(id), PaymentPatch { status, at })
            .await?;
        single(rows, "payment", id)
    }
}
