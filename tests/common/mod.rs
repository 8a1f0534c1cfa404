#![allow(dead_code)]

use std::sync::Arc;

use boxoffice_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        customer, event, inventory_slot,
        order::{self, OrderStatus, PaymentStatus},
        order_item, ticket,
        ticket::TicketStatus,
        ticket_type,
    },
    services::customers::CustomerInput,
    services::ticket_types::CreateTicketTypeRequest,
    AppState,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

/// Harness that boots the service stack against an in-memory SQLite
/// database with a single pooled connection, runs migrations, and offers
/// seeding helpers.
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());

        // One connection: each pooled connection of an in-memory SQLite
        // database would otherwise see its own empty schema.
        let db_config = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        Self { state }
    }

    pub async fn seed_event(&self) -> event::Model {
        let now = Utc::now();
        event::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set("Spring Gala".to_string()),
            slug: Set(format!("spring-gala-{}", Uuid::new_v4())),
            description: Set(None),
            short_description: Set(None),
            start_date: Set(now + ChronoDuration::days(30)),
            end_date: Set(None),
            timezone: Set("UTC".to_string()),
            status: Set(event::EventStatus::Published),
            is_published: Set(true),
            published_at: Set(Some(now)),
            total_capacity: Set(500),
            currency: Set("USD".to_string()),
            category: Set(Some("music".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed event")
    }

    /// Creates a ticket type through the service so inventory slots get
    /// provisioned exactly as in production.
    pub async fn seed_ticket_type(
        &self,
        event_id: Uuid,
        name: &str,
        price: Decimal,
        quantity: i32,
        max_quantity_per_order: Option<i32>,
    ) -> ticket_type::Model {
        self.state
            .services
            .ticket_types
            .create_ticket_type(CreateTicketTypeRequest {
                event_id,
                name: name.to_string(),
                description: None,
                price,
                quantity,
                sale_start_date: None,
                sale_end_date: None,
                min_quantity_per_order: None,
                max_quantity_per_order,
                sort_order: None,
                is_active: None,
            })
            .await
            .expect("seed ticket type")
    }

    pub fn customer_input(email: &str) -> CustomerInput {
        CustomerInput {
            user_id: None,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            phone: None,
            billing_address_line1: None,
            billing_address_line2: None,
            billing_city: None,
            billing_state: None,
            billing_country: None,
            billing_postal_code: None,
        }
    }

    /// Inserts the customer/order/order-item scaffolding needed to attach
    /// tickets without going through order placement.
    pub async fn seed_order_scaffolding(
        &self,
        ticket_type: &ticket_type::Model,
    ) -> (customer::Model, order::Model, order_item::Model) {
        let db = self.state.db.as_ref();
        let now = Utc::now();

        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(None),
            first_name: Set("Grace".to_string()),
            last_name: Set("Hopper".to_string()),
            email: Set(format!("grace-{}@example.com", Uuid::new_v4())),
            phone: Set(None),
            billing_address_line1: Set(None),
            billing_address_line2: Set(None),
            billing_city: Set(None),
            billing_state: Set(None),
            billing_country: Set(None),
            billing_postal_code: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed customer");

        let order = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer.id),
            order_number: Set(format!("ORD-TEST-{}", Uuid::new_v4())),
            status: Set(OrderStatus::Completed),
            payment_status: Set(PaymentStatus::Completed),
            payment_method: Set(Some("credit_card".to_string())),
            payment_intent_id: Set(None),
            subtotal: Set(ticket_type.price),
            tax: Set(Decimal::ZERO),
            fees: Set(Decimal::ZERO),
            total: Set(ticket_type.price),
            currency: Set("USD".to_string()),
            customer_email: Set(customer.email.clone()),
            customer_first_name: Set(customer.first_name.clone()),
            customer_last_name: Set(customer.last_name.clone()),
            customer_phone: Set(None),
            completed_at: Set(Some(now)),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed order");

        let order_item = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            ticket_type_id: Set(ticket_type.id),
            quantity: Set(1),
            unit_price: Set(ticket_type.price),
            subtotal: Set(ticket_type.price),
            ticket_type_name: Set(ticket_type.name.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("seed order item");

        (customer, order, order_item)
    }

    /// Claims slots of `ticket_type` by inserting tickets directly, one per
    /// timestamp, so listings can be tested against a known `(created_at,
    /// id)` distribution (including ties).
    pub async fn seed_claimed_tickets(
        &self,
        event_model: &event::Model,
        ticket_type: &ticket_type::Model,
        timestamps: &[DateTime<Utc>],
    ) -> Vec<ticket::Model> {
        let db = self.state.db.as_ref();

        let slots = inventory_slot::Entity::find()
            .filter(inventory_slot::Column::TicketTypeId.eq(ticket_type.id))
            .all(db)
            .await
            .expect("load slots");
        assert!(
            slots.len() >= timestamps.len(),
            "not enough slots provisioned for requested tickets"
        );

        let (customer, order, order_item) = self.seed_order_scaffolding(ticket_type).await;

        let mut tickets = Vec::with_capacity(timestamps.len());
        for (i, created_at) in timestamps.iter().enumerate() {
            let model = ticket::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                order_item_id: Set(order_item.id),
                event_id: Set(event_model.id),
                ticket_type_id: Set(ticket_type.id),
                customer_id: Set(customer.id),
                inventory_slot_id: Set(slots[i].id),
                ticket_code: Set(format!("TKT-TEST-{}-{}", i, Uuid::new_v4())),
                status: Set(TicketStatus::Valid),
                attendee_first_name: Set(None),
                attendee_last_name: Set(None),
                attendee_email: Set(None),
                is_checked_in: Set(false),
                checked_in_at: Set(None),
                checked_in_by: Set(None),
                event_title: Set(event_model.title.clone()),
                ticket_type_name: Set(ticket_type.name.clone()),
                price: Set(ticket_type.price),
                created_at: Set(*created_at),
                updated_at: Set(*created_at),
            }
            .insert(db)
            .await
            .expect("seed ticket");
            tickets.push(model);
        }

        tickets
    }

    pub async fn order_count(&self) -> u64 {
        order::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count orders")
    }

    pub async fn order_item_count(&self) -> u64 {
        order_item::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count order items")
    }

    pub async fn ticket_count(&self) -> u64 {
        ticket::Entity::find()
            .count(self.state.db.as_ref())
            .await
            .expect("count tickets")
    }

    pub async fn tickets_for_type(&self, ticket_type_id: Uuid) -> Vec<ticket::Model> {
        ticket::Entity::find()
            .filter(ticket::Column::TicketTypeId.eq(ticket_type_id))
            .all(self.state.db.as_ref())
            .await
            .expect("load tickets")
    }
}
