//! Order queries: creation, reads, guarded updates, unpaid deletes

#[path = "../common/mod.rs"]
mod common;

use common::*;

// ============ Create / Read ============

#[test]
fn test_create_order_starts_awaiting_payment_and_new() {
    let conn = setup_test_db();

    let input = CreateOrder {
        product_link: Some("https://shop.example.com/p/1".to_string()),
        quantity: Some(2),
        shipping_mode: Some(ShippingMode::Sea),
        ..CreateOrder::new("cust_1", 50_000)
    };
    let order = queries::create_order(&conn, &input, "GHS").expect("create should succeed");

    assert_eq!(order.customer_id, "cust_1");
    assert_eq!(order.total_minor, 50_000);
    assert_eq!(order.currency, "GHS");
    assert_eq!(order.payment_status, PaymentStatus::AwaitingPayment);
    assert_eq!(order.order_status, OrderStatus::New);
    assert_eq!(order.quantity, Some(2));
    assert_eq!(order.shipping_mode, Some(ShippingMode::Sea));
    assert!(order.paid_at.is_none());

    let fetched = queries::get_order(&conn, order.id)
        .expect("query failed")
        .expect("order should exist");
    assert_eq!(fetched, order);
}

#[test]
fn test_create_order_uses_explicit_currency() {
    let conn = setup_test_db();
    let input = CreateOrder {
        currency: Some("ngn".to_string()),
        ..CreateOrder::new("cust_1", 100)
    };
    let order = queries::create_order(&conn, &input, "GHS").unwrap();
    assert_eq!(order.currency, "NGN");
}

#[test]
fn test_order_ids_increase_and_are_not_reused() {
    let conn = setup_test_db();

    let first = create_test_order(&conn, 100);
    let second = create_test_order(&conn, 100);
    assert!(second.id > first.id);

    assert!(queries::delete_unpaid_order(&conn, second.id).unwrap());
    let third = create_test_order(&conn, 100);
    assert!(
        third.id > second.id,
        "a deleted order's id must not be handed out again"
    );
}

#[test]
fn test_negative_total_rejected_by_schema() {
    let conn = setup_test_db();
    let result = queries::create_order(&conn, &CreateOrder::new("cust_1", -1), "GHS");
    assert!(result.is_err());
}

#[test]
fn test_get_order_nonexistent() {
    let conn = setup_test_db();
    let result = queries::get_order(&conn, order_id(999)).expect("query should not error");
    assert!(result.is_none());
}

#[test]
fn test_list_orders_for_customer_newest_first() {
    let conn = setup_test_db();
    let a = queries::create_order(&conn, &CreateOrder::new("cust_a", 100), "GHS").unwrap();
    let _other = queries::create_order(&conn, &CreateOrder::new("cust_b", 100), "GHS").unwrap();
    let b = queries::create_order(&conn, &CreateOrder::new("cust_a", 200), "GHS").unwrap();

    let orders = queries::list_orders_for_customer(&conn, "cust_a").unwrap();
    let ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
}

// ============ Payment CAS ============

#[test]
fn test_try_mark_order_paid_succeeds_once() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 50_000);

    let first = queries::try_mark_order_paid(&conn, order.id).expect("should not error");
    let paid = first.expect("first mark should apply");
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.order_status, OrderStatus::Processing);
    assert!(paid.paid_at.is_some());
    assert_eq!(paid.total_minor, 50_000, "total must not change on payment");

    let second = queries::try_mark_order_paid(&conn, order.id).expect("should not error");
    assert!(second.is_none(), "second mark should match nothing");

    let stored = queries::get_order(&conn, order.id).unwrap().unwrap();
    assert_eq!(stored.paid_at, paid.paid_at, "paid_at must not be rewritten");
}

#[test]
fn test_try_mark_order_paid_nonexistent() {
    let conn = setup_test_db();
    let result = queries::try_mark_order_paid(&conn, order_id(12345)).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_try_mark_order_paid_keeps_cancelled_status() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 100);
    queries::try_transition_order_status(&conn, order.id, OrderStatus::New, OrderStatus::Cancelled)
        .unwrap()
        .expect("cancel should apply");

    let paid = queries::try_mark_order_paid(&conn, order.id).unwrap().unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.order_status, OrderStatus::Cancelled);
}

#[test]
fn test_refund_requires_paid() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 100);

    assert!(queries::try_mark_order_refunded(&conn, order.id).unwrap().is_none());

    queries::try_mark_order_paid(&conn, order.id).unwrap().unwrap();
    let refunded = queries::try_mark_order_refunded(&conn, order.id).unwrap().unwrap();
    assert_eq!(refunded.payment_status, PaymentStatus::Refunded);

    // Refunded never goes back to paid
    assert!(queries::try_mark_order_paid(&conn, order.id).unwrap().is_none());
    assert!(queries::try_mark_order_refunded(&conn, order.id).unwrap().is_none());
}

// ============ Fulfillment CAS ============

#[test]
fn test_transition_requires_expected_current_status() {
    let conn = setup_test_db();
    let order = create_paid_order(&conn, 100);
    assert_eq!(order.order_status, OrderStatus::Processing);

    // Stale expectation: caller thinks it's still new
    let stale = queries::try_transition_order_status(
        &conn,
        order.id,
        OrderStatus::New,
        OrderStatus::Cancelled,
    )
    .unwrap();
    assert!(stale.is_none());

    let moved = queries::try_transition_order_status(
        &conn,
        order.id,
        OrderStatus::Processing,
        OrderStatus::Purchased,
    )
    .unwrap()
    .expect("transition should apply");
    assert_eq!(moved.order_status, OrderStatus::Purchased);
}

#[test]
fn test_forward_transition_requires_payment() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 100);

    let result = queries::try_transition_order_status(
        &conn,
        order.id,
        OrderStatus::New,
        OrderStatus::Processing,
    )
    .unwrap();
    assert!(result.is_none(), "unpaid order must not progress");

    let stored = queries::get_order(&conn, order.id).unwrap().unwrap();
    assert_eq!(stored.order_status, OrderStatus::New);
}

// ============ Details ============

#[test]
fn test_update_order_details_leaves_money_alone() {
    let conn = setup_test_db();
    let order = create_paid_order(&conn, 7_500);

    let updated = queries::update_order_details(
        &conn,
        order.id,
        &UpdateOrderDetails {
            version: order.version,
            notes: Some("Bought from vendor, tracking pending".to_string()),
            attachment_url: Some("https://files.example.com/receipt.pdf".to_string()),
            product_link: None,
        },
    )
    .unwrap()
    .expect("order should exist");

    assert_eq!(updated.notes.as_deref(), Some("Bought from vendor, tracking pending"));
    assert_eq!(updated.total_minor, 7_500);
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(updated.order_status, OrderStatus::Processing);
    assert_eq!(updated.version, order.version + 1);
}

#[test]
fn test_update_order_details_refuses_stale_version() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 100);

    // Two editors read the same version; the first write wins
    let first = UpdateOrderDetails {
        version: order.version,
        notes: Some("Call customer about size".to_string()),
        ..Default::default()
    };
    let second = UpdateOrderDetails {
        version: order.version,
        notes: Some("Ship by sea".to_string()),
        ..Default::default()
    };

    assert!(queries::update_order_details(&conn, order.id, &first).unwrap().is_some());
    assert!(queries::update_order_details(&conn, order.id, &second).unwrap().is_none());

    let stored = queries::get_order(&conn, order.id).unwrap().unwrap();
    assert_eq!(stored.notes.as_deref(), Some("Call customer about size"));
}

#[test]
fn test_every_write_bumps_version() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 100);
    assert_eq!(order.version, 1);

    let paid = queries::try_mark_order_paid(&conn, order.id).unwrap().unwrap();
    assert_eq!(paid.version, 2);

    let moved = queries::try_transition_order_status(
        &conn,
        order.id,
        OrderStatus::Processing,
        OrderStatus::Purchased,
    )
    .unwrap()
    .unwrap();
    assert_eq!(moved.version, 3);

    let refunded = queries::try_mark_order_refunded(&conn, order.id).unwrap().unwrap();
    assert_eq!(refunded.version, 4);

    // An edit based on the pre-payment read is now stale
    let stale = UpdateOrderDetails {
        version: order.version,
        notes: Some("late note".to_string()),
        ..Default::default()
    };
    assert!(queries::update_order_details(&conn, order.id, &stale).unwrap().is_none());
}

#[test]
fn test_update_order_details_nonexistent() {
    let conn = setup_test_db();
    let result = queries::update_order_details(
        &conn,
        order_id(404),
        &UpdateOrderDetails {
            version: 1,
            notes: Some("x".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(result.is_none());
}

// ============ Deletes ============

#[test]
fn test_delete_unpaid_order() {
    let conn = setup_test_db();
    let order = create_test_order(&conn, 100);

    assert!(queries::delete_unpaid_order(&conn, order.id).unwrap());
    assert!(queries::get_order(&conn, order.id).unwrap().is_none());
    assert!(!queries::delete_unpaid_order(&conn, order.id).unwrap());
}

#[test]
fn test_delete_refuses_paid_order() {
    let conn = setup_test_db();
    let order = create_paid_order(&conn, 100);

    assert!(!queries::delete_unpaid_order(&conn, order.id).unwrap());
    assert!(queries::get_order(&conn, order.id).unwrap().is_some());
}
