use crate::clients::single;
use crate::error::Error;
use crate::model::{
    ItemStatus, NewOrder, NewOrderItem, Order, OrderFilter, OrderId, OrderItem, OrderItemFilter,
    OrderItemId, OrderItemPatch, OrderPatch, OrderStatus, SessionId,
};
use tracing::{debug, instrument};

record_client!(
    /// Client for the order records.
    OrderClient,
    Order,
    "order"
);

record_client!(
    /// Client for the order item records.
    OrderItemClient,
    OrderItem,
    "order item"
);

impl OrderClient {
    #[instrument(skip(self))]
    pub async fn create(&self, order: NewOrder) -> Result<Order, Error> {
        debug!("Sending request");
        Ok(self.inner.insert_one(order).await?)
    }

    #[instrument(skip(self))]
    pub async fn link_session(&self, id: OrderId, session_id: SessionId) -> Result<Order, Error> {
        debug!("Sending request");
        let rows = self
            .inner
            .update(OrderFilter::Id(id), OrderPatch::LinkSession(session_id))
            .await?;
        single(rows, "order", id)
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, Error> {
        debug!("Sending request");
        let rows = self
            .inner
            .update(OrderFilter::Id(id), OrderPatch::Status(status))
            .await?;
        single(rows, "order", id)
    }
}

impl OrderItemClient {
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn create_all(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, Error> {
        debug!("Sending request");
        Ok(self.inner.insert(items).await?)
    }

    /// Items of one order in creation order, which is the order the kitchen indexes them by.
    #[instrument(skip(self))]
    pub async fn for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>, Error> {
        debug!("Sending request");
        Ok(self.inner.select(OrderItemFilter::Order(order_id)).await?)
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: OrderItemId, status: ItemStatus) -> Result<OrderItem, Error> {
        debug!("Sending request");
        let rows = self
            .inner
            .update(OrderItemFilter::Id(id), OrderItemPatch::Status(status))
            .await?;
        single(rows, "order item", id)
    }
}
