mod common;

use common::{dec, scenario_cart, seed_tables, serve_all, system};
use dinein_orchestrator::intake::CartLine;
use dinein_orchestrator::model::{
    BillId, BillStatus, ItemStatus, OrderId, OrderStatus, PaymentMethod, PaymentStatus,
    SessionFilter, SessionStatus, SettlementStatus, TableId, TableStatus,
};
use dinein_orchestrator::saga::Step;
use dinein_orchestrator::{Error, RestaurantSystem};
use record_store::RecordClient;
use rust_decimal::Decimal;

/// Seating, ordering, kitchen and payment for one table, end to end.
#[tokio::test]
async fn test_full_visit_scenarios_a_b_c() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;

    // Scenario A: seating is idempotent
    let session = system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    let table = system.registry.require(table_id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.session_id, Some(session.id));
    assert_eq!(table.occupant.as_deref(), Some("Rossi"));

    let again = system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    assert_eq!(again.id, session.id);
    assert_eq!(
        system.registry.require(table_id).await.unwrap().status,
        TableStatus::Occupied
    );

    // Scenario B: serving the last item bills the order
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();
    assert!(placed.is_clean(), "{:?}", placed.warnings);
    assert_eq!(placed.value.order.session_id, Some(session.id));
    assert_eq!(placed.value.items.len(), 2);
    let order_id = placed.value.order.id;

    for index in 0..2 {
        for status in [ItemStatus::Wait, ItemStatus::Ready] {
            system.kitchen.advance_item(order_id, index, status).await.unwrap();
        }
    }
    let first = system
        .kitchen
        .advance_item(order_id, 0, ItemStatus::Served)
        .await
        .unwrap();
    assert!(!first.value.order_completed);
    let last = system
        .kitchen
        .advance_item(order_id, 1, ItemStatus::Served)
        .await
        .unwrap();
    assert!(last.value.order_completed);

    let bill = last.value.bill.expect("order should be billed");
    assert_eq!(bill.subtotal, dec("250"));
    assert_eq!(bill.tax, dec("45"));
    assert_eq!(bill.final_amount, dec("295"));
    assert_eq!(bill.payment_status, PaymentStatus::Pending);
    assert_eq!(bill.session_id(), Some(session.id));

    // Scenario C: paying closes everything down
    let settlement = system
        .billing
        .pay_and_close(bill.id, table_id, PaymentMethod::Card)
        .await
        .unwrap();
    assert!(settlement.is_clean(), "{:?}", settlement.warnings);
    assert_eq!(settlement.value.bill.status, BillStatus::Closed);
    assert_eq!(settlement.value.bill.payment_status, PaymentStatus::Paid);
    assert_eq!(
        settlement.value.session.map(|s| s.status),
        Some(SessionStatus::Closed)
    );
    let payment = settlement.value.payment.expect("payment recorded");
    assert_eq!(payment.status, SettlementStatus::Completed);
    assert_eq!(payment.amount, dec("295"));

    let table = system.registry.require(table_id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);
    assert_eq!(table.occupant, None);
    assert_eq!(table.session_id, None);
    assert!(system.sessions.get_active_session(table_id).await.unwrap().is_none());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_at_most_one_active_session_per_table() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;

    let (a, b) = tokio::join!(
        system.sessions.start_session(table_id, "Rossi", 2),
        system.sessions.start_session(table_id, "Bianchi", 3),
    );
    assert_eq!(a.unwrap().id, b.unwrap().id);

    let sessions = &system.stores().sessions;
    assert_eq!(
        sessions.select(SessionFilter::Table(table_id)).await.unwrap().len(),
        1
    );

    system.sessions.close_session(table_id).await.unwrap();
    let next = system.sessions.start_session(table_id, "Verdi", 4).await.unwrap();
    let active = sessions
        .select(SessionFilter::ActiveForTable(table_id))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, next.id);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_session_requires_active_session() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;

    let result = system.sessions.cancel_session(table_id).await;
    assert!(matches!(result, Err(Error::NoActiveSession(id)) if id == table_id));

    system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    let cancelled = system.sessions.cancel_session(table_id).await.unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);
    assert!(cancelled.closed_at.is_some());
    assert_eq!(
        system.registry.require(table_id).await.unwrap().status,
        TableStatus::Available
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let (system, _clock, _notifier) = system();
    seed_tables(&system).await;
    let missing = TableId(99);

    assert!(matches!(
        system.sessions.start_session(missing, "Rossi", 2).await,
        Err(Error::NotFound { entity: "table", .. })
    ));
    assert!(system.registry.get_table(missing).await.unwrap().is_none());

    system.shutdown().await.unwrap();
}

/// `final == subtotal - discount + tax` and the subtotal follows the live items.
#[tokio::test]
async fn test_session_bill_tracks_item_composition() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let session = system.sessions.start_session(table_id, "Rossi", 4).await.unwrap();

    let first = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();
    let bill = first.value.bill.clone().unwrap();
    assert_eq!(bill.subtotal, dec("250"));

    let second = system
        .intake
        .place_order(
            table_id,
            vec![CartLine::new("dish_wine", "House red", 2, dec("18.50")).with_discount(dec("7"))],
            "Rossi",
            "Marco",
        )
        .await
        .unwrap();
    let bill = second.value.bill.unwrap();
    assert_eq!(bill.id, first.value.bill.unwrap().id, "one open bill per session");
    assert_eq!(bill.subtotal, dec("280"));
    assert_eq!(bill.tax, dec("50.40"));
    assert_eq!(bill.final_amount, bill.subtotal - bill.discount + bill.tax);

    // Cancelled orders drop out of the session bill
    let cancelled = system
        .intake
        .cancel_order(first.value.order.id)
        .await
        .unwrap();
    assert!(cancelled.is_clean());
    let bill = system
        .billing
        .open_bill_for_session(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.subtotal, dec("30"));
    assert_eq!(bill.final_amount, dec("35.40"));

    let recalculated = system.billing.recalculate_total(bill.id).await.unwrap();
    assert_eq!(recalculated, bill, "recalculation is idempotent");

    let view = system.billing.bill_view(bill.id).await.unwrap();
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].name, "House red");

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_order_without_session_gets_its_own_bill() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;

    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Walk-in", "Marco")
        .await
        .unwrap();
    assert!(placed.warned(Step::ResolveSession));
    assert!(placed.value.bill.is_none());
    assert_eq!(placed.value.order.session_id, None);
    let order_id = placed.value.order.id;

    serve_all(&system, order_id, 2).await;

    let bill = system.billing.bill_for_order(order_id).await.unwrap().unwrap();
    assert_eq!(bill.order_id(), Some(order_id));
    assert_eq!(bill.subtotal, dec("250"));
    assert_eq!(bill.tax, dec("45"));
    assert_eq!(bill.final_amount, dec("295"));
    assert_eq!(bill.payment_status, PaymentStatus::Pending);

    let order = system.intake.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    // Paying an order bill still frees the table
    let settlement = system
        .billing
        .pay_and_close(bill.id, table_id, PaymentMethod::Cash)
        .await
        .unwrap();
    assert!(settlement.value.session.is_none());
    assert_eq!(settlement.value.table.status, TableStatus::Available);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_late_session_link_folds_order_into_bill() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;

    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();
    let order_id = placed.value.order.id;

    let unlinked = system.intake.link_to_session(order_id).await;
    assert!(matches!(unlinked, Err(Error::NoActiveSession(_))));

    let session = system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    let linked = system.intake.link_to_session(order_id).await.unwrap();
    assert_eq!(linked.value.session_id, Some(session.id));

    let bill = system
        .billing
        .open_bill_for_session(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bill.subtotal, dec("250"));

    system.shutdown().await.unwrap();
}

/// Places an order while the table has no session and serves it, which gives it an
/// order bill of 295.
async fn walk_in_order_bill(system: &RestaurantSystem, table_id: TableId) -> (OrderId, BillId) {
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Walk-in", "Marco")
        .await
        .unwrap();
    let order_id = placed.value.order.id;
    serve_all(system, order_id, 2).await;
    let bill = system.billing.bill_for_order(order_id).await.unwrap().unwrap();
    assert_eq!(bill.final_amount, dec("295"));
    (order_id, bill.id)
}

#[tokio::test]
async fn test_order_with_own_bill_stays_off_session_bill() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let (order_id, order_bill) = walk_in_order_bill(&system, table_id).await;

    let session = system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    let linked = system.intake.link_to_session(order_id).await.unwrap();
    assert_eq!(linked.value.session_id, Some(session.id));
    assert!(linked.warned(Step::EnsureSessionBill));

    let wine = vec![CartLine::new("dish_wine", "House red", 1, dec("20"))];
    let placed = system
        .intake
        .place_order(table_id, wine, "Rossi", "Marco")
        .await
        .unwrap();
    let session_bill = placed.value.bill.unwrap();
    assert_eq!(session_bill.subtotal, dec("20"));
    let recalculated = system.billing.recalculate_total(session_bill.id).await.unwrap();
    assert_eq!(recalculated.subtotal, dec("20"));

    let order_bill = system.billing.get_bill(order_bill).await.unwrap().unwrap();
    assert_eq!(order_bill.subtotal, dec("250"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_paying_walk_in_bill_closes_the_seated_session() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let (_, order_bill) = walk_in_order_bill(&system, table_id).await;
    let seated = system.sessions.start_session(table_id, "Walk-in", 2).await.unwrap();

    let settlement = system
        .billing
        .pay_and_close(order_bill, table_id, PaymentMethod::Cash)
        .await
        .unwrap();
    assert!(settlement.is_clean(), "{:?}", settlement.warnings);
    let closed = settlement.value.session.unwrap();
    assert_eq!(closed.id, seated.id);
    assert_eq!(closed.status, SessionStatus::Closed);
    assert_eq!(settlement.value.table.status, TableStatus::Available);
    assert!(system.sessions.get_active_session(table_id).await.unwrap().is_none());

    // The next party gets a session of its own
    let next = system.sessions.start_session(table_id, "Bianchi", 3).await.unwrap();
    assert_ne!(next.id, seated.id);
    assert_eq!(next.party_size, 3);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_paying_walk_in_bill_keeps_owing_party_seated() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    let (_, order_bill) = walk_in_order_bill(&system, table_id).await;
    let seated = system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();

    let settlement = system
        .billing
        .pay_and_close(order_bill, table_id, PaymentMethod::Cash)
        .await
        .unwrap();
    assert!(settlement.warned(Step::CloseSession));
    assert_eq!(settlement.value.bill.payment_status, PaymentStatus::Paid);
    assert!(settlement.value.session.is_none());
    assert_eq!(settlement.value.table.status, TableStatus::Occupied);
    let active = system.sessions.get_active_session(table_id).await.unwrap().unwrap();
    assert_eq!(active.id, seated.id);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_pay_twice_and_refund() {
    let (system, _clock, _notifier) = system();
    let table_id = seed_tables(&system).await;
    system.sessions.start_session(table_id, "Rossi", 2).await.unwrap();
    let placed = system
        .intake
        .place_order(table_id, scenario_cart(), "Rossi", "Marco")
        .await
        .unwrap();
    let bill_id = placed.value.bill.unwrap().id;

    system
        .billing
        .pay_and_close(bill_id, table_id, PaymentMethod::Card)
        .await
        .unwrap();
    // Re-driving a finished payment does not charge again
    let again = system
        .billing
        .pay_and_close(bill_id, table_id, PaymentMethod::Card)
        .await
        .unwrap();
    assert!(again.is_clean(), "{:?}", again.warnings);
    assert_eq!(system.billing.payments_for(bill_id).await.unwrap().len(), 1);

    let refunded = system.billing.refund(bill_id).await.unwrap();
    assert!(refunded.is_clean());
    assert_eq!(refunded.value.payment_status, PaymentStatus::Refunded);
    let payments = system.billing.payments_for(bill_id).await.unwrap();
    assert_eq!(payments[0].status, SettlementStatus::Refunded);
    assert_eq!(
        system.registry.require(table_id).await.unwrap().status,
        TableStatus::Available
    );

    assert!(matches!(
        system.billing.refund(bill_id).await,
        Err(Error::Rejected(_))
    ));
    assert!(matches!(
        system
            .billing
            .pay_and_close(bill_id, table_id, PaymentMethod::Card)
            .await,
        Err(Error::PaymentFailed(_))
    ));

    let stats = system.billing.statistics().await.unwrap();
    assert_eq!(stats.refunded_bills, 1);
    assert_eq!(stats.total_revenue, Decimal::ZERO);

    system.shutdown().await.unwrap();
}
