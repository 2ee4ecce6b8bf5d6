//! Order items and the kitchen pipeline they move through.

use crate::model::{OrderId, OrderItemId, RecordViolation};
use record_store::Record;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Kitchen preparation status. The pipeline is strictly linear:
/// `in-kitchen → wait → ready → served`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    InKitchen,
    Wait,
    Ready,
    Served,
}

impl ItemStatus {
    /// The pipeline in order.
    pub const PIPELINE: [ItemStatus; 4] = [
        ItemStatus::InKitchen,
        ItemStatus::Wait,
        ItemStatus::Ready,
        ItemStatus::Served,
    ];

    /// The only status this one may move to, `None` once served.
    pub fn next(self) -> Option<ItemStatus> {
        match self {
            ItemStatus::InKitchen => Some(ItemStatus::Wait),
            ItemStatus::Wait => Some(ItemStatus::Ready),
            ItemStatus::Ready => Some(ItemStatus::Served),
            ItemStatus::Served => None,
        }
    }

    pub fn can_advance_to(self, target: ItemStatus) -> bool {
        self.next() == Some(target)
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ItemStatus::InKitchen => "in-kitchen",
            ItemStatus::Wait => "wait",
            ItemStatus::Ready => "ready",
            ItemStatus::Served => "served",
        };
        f.write_str(label)
    }
}

/// One line of an order. Dish, price, discount and quantity are a snapshot taken at
/// placement time; only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub dish_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub note: Option<String>,
    pub status: ItemStatus,
}

impl OrderItem {
    /// `unit_price × quantity − discount`.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity) - self.discount
    }
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub dish_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub enum OrderItemFilter {
    Id(OrderItemId),
    Order(OrderId),
    Orders(Vec<OrderId>),
}

#[derive(Debug, Clone)]
pub enum OrderItemPatch {
    Status(ItemStatus),
}

impl Record for OrderItem {
    type Id = OrderItemId;
    type New = NewOrderItem;
    type Filter = OrderItemFilter;
    type Patch = OrderItemPatch;
    type Error = RecordViolation;

    fn from_insert(id: OrderItemId, new: NewOrderItem) -> Result<Self, RecordViolation> {
        if new.quantity == 0 {
            return Err(RecordViolation::InvalidQuantity(new.quantity));
        }
        for amount in [new.unit_price, new.discount] {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(RecordViolation::NegativeAmount(amount));
            }
        }
        let line_total = new.unit_price * Decimal::from(new.quantity);
        if new.discount > line_total {
            return Err(RecordViolation::DiscountExceedsLine {
                discount: new.discount,
                line_total,
            });
        }
        Ok(Self {
            id,
            order_id: new.order_id,
            dish_id: new.dish_id,
            name: new.name,
            quantity: new.quantity,
            unit_price: new.unit_price,
            discount: new.discount,
            note: new.note,
            status: ItemStatus::InKitchen,
        })
    }

    fn matches(&self, filter: &OrderItemFilter) -> bool {
        match filter {
            OrderItemFilter::Id(id) => self.id == *id,
            OrderItemFilter::Order(order_id) => self.order_id == *order_id,
            OrderItemFilter::Orders(order_ids) => order_ids.contains(&self.order_id),
        }
    }

    fn apply_patch(&mut self, patch: &OrderItemPatch) -> Result<(), RecordViolation> {
        match patch {
            OrderItemPatch::Status(target) => {
                if !self.status.can_advance_to(*target) {
                    return Err(RecordViolation::ItemTransition {
                        from: self.status,
                        to: *target,
                    });
                }
                self.status = *target;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(quantity: u32, unit_price: i64, discount: i64) -> NewOrderItem {
        NewOrderItem {
            order_id: OrderId(1),
            dish_id: "dish_carbonara".into(),
            name: "Carbonara".into(),
            quantity,
            unit_price: Decimal::from(unit_price),
            discount: Decimal::from(discount),
            note: None,
        }
    }

    #[test]
    fn test_pipeline_is_single_step() {
        assert!(ItemStatus::InKitchen.can_advance_to(ItemStatus::Wait));
        assert!(!ItemStatus::InKitchen.can_advance_to(ItemStatus::Served));
        assert!(!ItemStatus::Ready.can_advance_to(ItemStatus::Wait));
        assert_eq!(ItemStatus::Served.next(), None);
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        let mut item = OrderItem::from_insert(OrderItemId(1), new_item(1, 10, 0)).unwrap();
        let result = item.apply_patch(&OrderItemPatch::Status(ItemStatus::Served));
        assert_eq!(
            result,
            Err(RecordViolation::ItemTransition {
                from: ItemStatus::InKitchen,
                to: ItemStatus::Served
            })
        );
        assert_eq!(item.status, ItemStatus::InKitchen);
    }

    #[test]
    fn test_line_validation() {
        assert_eq!(
            OrderItem::from_insert(OrderItemId(1), new_item(0, 10, 0)),
            Err(RecordViolation::InvalidQuantity(0))
        );
        assert!(matches!(
            OrderItem::from_insert(OrderItemId(1), new_item(2, 10, 21)),
            Err(RecordViolation::DiscountExceedsLine { .. })
        ));
        let item = OrderItem::from_insert(OrderItemId(1), new_item(2, 10, 5)).unwrap();
        assert_eq!(item.line_total(), Decimal::from(15));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::InKitchen).unwrap(),
            "\"in-kitchen\""
        );
    }
}
