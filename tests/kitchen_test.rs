mod common;

use common::{opening_time, real_stores, scenario_cart, seed_tables, system};
use dinein_orchestrator::clients::OrderItemClient;
use dinein_orchestrator::clock::ManualClock;
use dinein_orchestrator::config::Config;
use dinein_orchestrator::model::{ItemStatus, OrderId, OrderItem, OrderItemId, OrderStatus};
use dinein_orchestrator::notify::{LogNotifier, Notification};
use dinein_orchestrator::sync::SyncKey;
use dinein_orchestrator::{Error, RestaurantSystem};
use record_store::mock::MockStore;
use record_store::StoreError;
use rust_decimal::Decimal;
use std::sync::Arc;

#[tokio::test]
async fn test_skipping_a_stage_is_rejected_before_any_write() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();
    let order_id = placed.value.order.id;

    let result = system
        .kitchen
        .advance_item(order_id, 0, ItemStatus::Served)
        .await;
    assert!(matches!(
        result,
        Err(Error::InvalidTransition { ref from, ref to }) if from == "in-kitchen" && to == "served"
    ));

    let backwards = system.kitchen.advance_item(order_id, 0, ItemStatus::InKitchen).await;
    assert!(matches!(backwards, Err(Error::InvalidTransition { .. })));

    let items = system.intake.items_of(order_id).await.unwrap();
    assert_eq!(items[0].status, ItemStatus::InKitchen);
    assert!(!system.sync.is_suppressed(SyncKey::Order(order_id)).await);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_item_index_is_not_found() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();

    let result = system
        .kitchen
        .advance_item(placed.value.order.id, 2, ItemStatus::Wait)
        .await;
    assert!(matches!(result, Err(Error::NotFound { entity: "order item", .. })));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ready_notifies_front_of_house() {
    let (system, _clock, notifier) = system();
    let table_id = seed_tables(&system).await;
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();
    let order_id = placed.value.order.id;

    system.kitchen.advance_item(order_id, 1, ItemStatus::Wait).await.unwrap();
    let ready = system.kitchen.advance_item(order_id, 1, ItemStatus::Ready).await.unwrap();
    assert!(ready.is_clean());
    assert_eq!(ready.value.item.status, ItemStatus::Ready);

    assert_eq!(
        notifier.sent(),
        vec![
            Notification::NewOrder {
                order_id,
                table_number: 5,
                item_count: 2
            },
            Notification::OrderReady {
                order_id,
                table_number: 5
            },
        ]
    );

    system.shutdown().await.unwrap();
}

/// A failed item write puts the kitchen board back and lets the next poll through.
/// Two terminals serving the last two items at once still complete and bill the order.
#[tokio::test]
async fn test_concurrent_last_serves_complete_the_order() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Walk-in", "Marco")
        .await
        .unwrap();
    let order_id = placed.value.order.id;
    for index in 0..2 {
        for status in [ItemStatus::Wait, ItemStatus::Ready] {
            system.kitchen.advance_item(order_id, index, status).await.unwrap();
        }
    }

    let (first, second) = tokio::join!(
        system.kitchen.advance_item(order_id, 0, ItemStatus::Served),
        system.kitchen.advance_item(order_id, 1, ItemStatus::Served),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(first.value.order_completed || second.value.order_completed);

    let order = system.intake.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    let bill = system.billing.bill_for_order(order_id).await.unwrap().unwrap();
    assert_eq!(bill.final_amount, Decimal::from(295));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_write_reverts_optimistic_change() {
    let mut items = MockStore::<OrderItem>::new();
    let mut stores = real_stores();
    stores.items = OrderItemClient::new(items.client());

    let clock = Arc::new(ManualClock::new(opening_time()));
    let system = RestaurantSystem::from_stores(
        Config::default(),
        stores,
        clock,
        Arc::new(LogNotifier),
    );
    let table_id = seed_tables(&system).await;

    items.expect_insert().return_ok(vec![sample_item(1)]);
    let placed = system
        .intake
        .place_order(table_id, scenario_cart()[..1].to_vec(), "Rossi", "Marco")
        .await
        .unwrap();
    let order_id = placed.value.order.id;
    let item = placed.value.items[0].clone();

    // Load the board, then fail the write
    items.expect_select().return_ok(vec![item.clone()]);
    system.sync.poll_orders().await.unwrap();
    items.expect_select().return_ok(vec![item.clone()]);
    items
        .expect_update()
        .return_err(StoreError::Unavailable("write refused".into()));

    let result = system.kitchen.advance_item(order_id, 0, ItemStatus::Wait).await;
    assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));

    let board = system.sync.orders();
    assert_eq!(board[0].items[0].status, ItemStatus::InKitchen);
    assert!(!system.sync.is_suppressed(SyncKey::Order(order_id)).await);
    items.verify();

    system.shutdown().await.unwrap();
}

fn sample_item(order: u32) -> OrderItem {
    OrderItem {
        id: OrderItemId(1),
        order_id: OrderId(order),
        dish_id: "dish_lasagna".into(),
        name: "Lasagna".into(),
        quantity: 2,
        unit_price: Decimal::from(100),
        discount: Decimal::ZERO,
        note: None,
        status: ItemStatus::InKitchen,
    }
}
