mod common;

use assert_matches::assert_matches;
use boxoffice_api::{
    entities::order::OrderStatus,
    errors::{ErrorKind, ServiceError},
    services::orders::{ClaimContext, CreateOrderRequest, OrderService, TicketSelection},
};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

use common::TestApp;

fn order_request(
    email: &str,
    selections: Vec<TicketSelection>,
) -> CreateOrderRequest {
    CreateOrderRequest {
        customer: TestApp::customer_input(email),
        tickets: selections,
        payment_method: None,
    }
}

#[tokio::test]
async fn placing_an_order_claims_slots_and_completes_payment() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "General Admission", dec!(25.00), 5, None)
        .await;

    let result = app
        .state
        .services
        .orders
        .create_order(order_request(
            "buyer@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 2,
            }],
        ))
        .await
        .expect("order should succeed");

    assert_eq!(result.tickets.len(), 2);
    assert_eq!(result.subtotal, dec!(50.00));
    assert_eq!(result.tax, dec!(4.00));
    assert_eq!(result.fees, dec!(2.50));
    assert_eq!(result.total, dec!(56.50));
    assert!(result.order_number.starts_with("ORD-"));

    // Each ticket claimed a distinct slot.
    let tickets = app.tickets_for_type(tt.id).await;
    assert_eq!(tickets.len(), 2);
    let mut slot_ids: Vec<Uuid> = tickets.iter().map(|t| t.inventory_slot_id).collect();
    slot_ids.sort();
    slot_ids.dedup();
    assert_eq!(slot_ids.len(), 2);

    // Synthetic payment completed the order.
    let details = app
        .state
        .services
        .orders
        .get_order(result.order_id)
        .await
        .expect("fetch order")
        .expect("order exists");
    assert_eq!(details.status, OrderStatus::Completed);
    assert!(details.completed_at.is_some());

    // Availability reflects the claims.
    let available = app
        .state
        .services
        .ticket_types
        .available_slots(tt.id)
        .await
        .expect("availability");
    assert_eq!(available, 3);
}

#[tokio::test]
async fn order_is_all_or_nothing_across_ticket_types() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let plenty = app
        .seed_ticket_type(event.id, "General Admission", dec!(25.00), 5, None)
        .await;
    let scarce = app
        .seed_ticket_type(event.id, "VIP", dec!(100.00), 1, None)
        .await;

    let err = app
        .state
        .services
        .orders
        .create_order(order_request(
            "buyer@example.com",
            vec![
                TicketSelection {
                    ticket_type_id: plenty.id,
                    quantity: 2,
                },
                TicketSelection {
                    ticket_type_id: scarce.id,
                    quantity: 3,
                },
            ],
        ))
        .await
        .expect_err("order should fail on the scarce type");

    assert_matches!(
        err,
        ServiceError::InsufficientInventory {
            available: 1,
            requested: 3,
            ..
        }
    );

    // Nothing from the failed order may be observable.
    assert_eq!(app.order_count().await, 0);
    assert_eq!(app.order_item_count().await, 0);
    assert_eq!(app.ticket_count().await, 0);
}

#[tokio::test]
async fn exhausted_type_reports_insufficient_inventory() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "General Admission", dec!(25.00), 5, None)
        .await;

    app.state
        .services
        .orders
        .create_order(order_request(
            "first@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 5,
            }],
        ))
        .await
        .expect("first order takes everything");

    let err = app
        .state
        .services
        .orders
        .create_order(order_request(
            "second@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 1,
            }],
        ))
        .await
        .expect_err("no stock left");

    assert_eq!(err.kind(), ErrorKind::InsufficientInventory);

    // Exactly the first order's rows exist; no partial second order.
    assert_eq!(app.order_count().await, 1);
    assert_eq!(app.ticket_count().await, 5);
}

#[tokio::test]
async fn claiming_the_same_slot_twice_is_a_conflict() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "VIP", dec!(100.00), 1, None)
        .await;
    let (customer, order, order_item) = app.seed_order_scaffolding(&tt).await;

    let slots = app
        .state
        .services
        .ticket_types
        .available_slots(tt.id)
        .await
        .expect("availability");
    assert_eq!(slots, 1);

    let slot = boxoffice_api::entities::inventory_slot::Entity::find()
        .one(app.state.db.as_ref())
        .await
        .expect("load slot")
        .expect("slot exists");

    let txn = app.state.db.begin().await.expect("begin");

    let first = OrderService::claim_slot(
        &txn,
        ClaimContext {
            order_id: order.id,
            order_item_id: order_item.id,
            event: &event,
            ticket_type: &tt,
            customer_id: customer.id,
            slot_id: slot.id,
        },
    )
    .await;
    assert!(first.is_ok(), "first claim wins: {:?}", first.err());

    // Same slot again: discovery said it was free, the constraint says no.
    let second = OrderService::claim_slot(
        &txn,
        ClaimContext {
            order_id: order.id,
            order_item_id: order_item.id,
            event: &event,
            ticket_type: &tt,
            customer_id: customer.id,
            slot_id: slot.id,
        },
    )
    .await;

    let err = second.expect_err("second claim must lose");
    assert_eq!(err.kind(), ErrorKind::InventoryConflict);

    txn.rollback().await.expect("rollback");
}

#[tokio::test]
async fn quantity_above_per_order_limit_is_rejected() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "General Admission", dec!(25.00), 10, Some(4))
        .await;

    let err = app
        .state
        .services
        .orders
        .create_order(order_request(
            "buyer@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 5,
            }],
        ))
        .await
        .expect_err("limit enforced");

    assert_eq!(err.kind(), ErrorKind::LimitExceeded);
    assert_eq!(app.order_count().await, 0);
}

#[tokio::test]
async fn unknown_ticket_type_is_not_found() {
    let app = TestApp::new().await;
    app.seed_event().await;

    let err = app
        .state
        .services
        .orders
        .create_order(order_request(
            "buyer@example.com",
            vec![TicketSelection {
                ticket_type_id: Uuid::new_v4(),
                quantity: 1,
            }],
        ))
        .await
        .expect_err("missing type");

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn repeat_buyer_resolves_to_the_same_customer() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "General Admission", dec!(25.00), 10, None)
        .await;

    let first = app
        .state
        .services
        .orders
        .create_order(order_request(
            "repeat@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 1,
            }],
        ))
        .await
        .expect("first order");

    let second = app
        .state
        .services
        .orders
        .create_order(order_request(
            "repeat@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 1,
            }],
        ))
        .await
        .expect("second order");

    assert_eq!(first.customer_id, second.customer_id);
}

#[tokio::test]
async fn persisted_totals_follow_the_pricing_rule() {
    let app = TestApp::new().await;
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "Early Bird", dec!(33.35), 10, None)
        .await;

    let result = app
        .state
        .services
        .orders
        .create_order(order_request(
            "buyer@example.com",
            vec![TicketSelection {
                ticket_type_id: tt.id,
                quantity: 3,
            }],
        ))
        .await
        .expect("order succeeds");

    // subtotal 100.05; tax 8.004 -> 8.00; fees 5.0025 -> 5.00
    assert_eq!(result.subtotal, dec!(100.05));
    assert_eq!(result.tax, dec!(8.00));
    assert_eq!(result.fees, dec!(5.00));
    assert_eq!(result.total, dec!(113.05));

    let details = app
        .state
        .services
        .orders
        .get_order(result.order_id)
        .await
        .expect("fetch")
        .expect("exists");
    assert_eq!(details.total, result.total);
    assert_eq!(details.subtotal + details.tax + details.fees, details.total);
}

// Requires a database that executes transactions concurrently (PostgreSQL);
// the single-connection SQLite harness serializes them and never produces
// the race. Run with: DATABASE_URL=postgres://... cargo test -- --ignored
#[tokio::test]
#[ignore = "requires a PostgreSQL integration environment"]
async fn concurrent_buyers_of_the_last_slot_never_oversell() {
    use boxoffice_api::{config::AppConfig, db, AppState};
    use std::sync::Arc;

    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at PostgreSQL");
    let cfg = AppConfig::new(url, "test".to_string());
    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let state = AppState::new(Arc::new(pool), cfg);

    let app = TestApp { state };
    let event = app.seed_event().await;
    let tt = app
        .seed_ticket_type(event.id, "Last Seat", dec!(50.00), 1, None)
        .await;

    let mut tasks = Vec::new();
    for i in 0..2 {
        let orders = app.state.services.orders.clone();
        let ticket_type_id = tt.id;
        tasks.push(tokio::spawn(async move {
            orders
                .create_order(CreateOrderRequest {
                    customer: TestApp::customer_input(&format!("racer{}@example.com", i)),
                    tickets: vec![TicketSelection {
                        ticket_type_id,
                        quantity: 1,
                    }],
                    payment_method: None,
                })
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.expect("task join") {
            Ok(_) => successes += 1,
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::InventoryConflict, "loser gets a conflict");
                conflicts += 1;
            }
        }
    }

    assert_eq!(successes, 1, "exactly one buyer gets the seat");
    assert_eq!(conflicts, 1);
    assert_eq!(app.tickets_for_type(tt.id).await.len(), 1, "no oversell");
}
