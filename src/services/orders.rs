use crate::{
    db::DbPool,
    entities::{
        event::{Entity as EventEntity, Model as EventModel},
        inventory_slot::{self, Entity as InventorySlotEntity, Model as InventorySlotModel},
        order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus, PaymentStatus},
        order_item,
        ticket::{self, Entity as TicketEntity, TicketStatus},
        ticket_type::{Entity as TicketTypeEntity, Model as TicketTypeModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::customers::{CustomerInput, CustomerService},
};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Query, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const TAX_RATE: Decimal = dec!(0.08);
const FEE_RATE: Decimal = dec!(0.05);

/// Regenerating a colliding ticket code more than a couple of times means
/// something other than luck is wrong.
const TICKET_CODE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketSelection {
    pub ticket_type_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate]
    pub customer: CustomerInput,
    #[validate(length(min = 1, message = "At least one ticket selection is required"))]
    pub tickets: Vec<TicketSelection>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: Uuid,
    pub ticket_code: String,
    pub event_title: String,
    pub ticket_type_name: String,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub fees: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub tickets: Vec<TicketSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderTicket {
    pub id: Uuid,
    pub ticket_code: String,
    pub event_title: String,
    pub ticket_type_name: String,
    pub price: Decimal,
    pub status: TicketStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetails {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub fees: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub customer_email: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<OrderTicket>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Order totals derived from a subtotal. Each derived field is rounded to
/// two decimals exactly once (half-up); the total is the plain sum of the
/// already-rounded parts and is never re-derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub fees: Decimal,
    pub total: Decimal,
}

pub fn order_totals(subtotal: Decimal) -> OrderTotals {
    let tax =
        (subtotal * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fees =
        (subtotal * FEE_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    OrderTotals {
        subtotal,
        tax,
        fees,
        total: subtotal + tax + fees,
    }
}

struct AllocatedType {
    ticket_type: TicketTypeModel,
    requested: u32,
    slots: Vec<InventorySlotModel>,
}

/// Service for placing and managing ticket orders.
///
/// Order placement uses optimistic slot claiming: slot discovery takes no
/// lock, so two concurrent buyers can both see the same slot as free. The
/// unique index on `tickets.inventory_slot_id` decides the winner at insert
/// time; the loser's whole transaction rolls back and surfaces
/// [`ServiceError::InventoryConflict`]. There is no counter to get out of
/// sync — slots are never mutated, only referenced or not.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Places an order: resolves the customer, allocates inventory slots
    /// for every selection, writes the order aggregate and completes the
    /// synthetic payment, all inside one transaction. Either the whole
    /// order materializes or none of it does.
    ///
    /// No internal retry on a lost claim race: retrying would require
    /// re-running discovery, which is the caller's resubmit.
    #[instrument(skip(self, request), fields(email = %request.customer.email, selections = request.tickets.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResult, ServiceError> {
        request.validate()?;

        let db = self.db_pool.as_ref();
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let outcome = self.place_order(&txn, request).await;

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(|e| {
                    error!(error = %e, order_id = %result.order_id, "Failed to commit order creation transaction");
                    ServiceError::DatabaseError(e)
                })?;

                info!(
                    order_id = %result.order_id,
                    order_number = %result.order_number,
                    total = %result.total,
                    tickets = result.tickets.len(),
                    "Order created successfully"
                );

                if let Some(event_sender) = &self.event_sender {
                    for event in [
                        Event::OrderCreated(result.order_id),
                        Event::OrderCompleted(result.order_id),
                    ] {
                        if let Err(e) = event_sender.send(event).await {
                            warn!(error = %e, order_id = %result.order_id, "Failed to send order event");
                        }
                    }
                }

                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!(error = %rollback_err, "Failed to roll back order creation transaction");
                }
                Err(e)
            }
        }
    }

    async fn place_order(
        &self,
        txn: &DatabaseTransaction,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResult, ServiceError> {
        // 1. Validate selections and discover free slots. Deliberately no
        // SELECT ... FOR UPDATE: the claim step below is the arbiter.
        let mut allocations = Vec::with_capacity(request.tickets.len());
        let mut event_id: Option<Uuid> = None;

        for selection in &request.tickets {
            selection.validate()?;

            let ticket_type = TicketTypeEntity::find_by_id(selection.ticket_type_id)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    warn!(ticket_type_id = %selection.ticket_type_id, "Ticket type not found");
                    ServiceError::NotFound(format!("Ticket type {}", selection.ticket_type_id))
                })?;

            if let Some(max) = ticket_type.max_quantity_per_order {
                if selection.quantity > max as u32 {
                    return Err(ServiceError::LimitExceeded(format!(
                        "Maximum {} tickets allowed per order for {}",
                        max, ticket_type.name
                    )));
                }
            }

            match event_id {
                None => event_id = Some(ticket_type.event_id),
                Some(id) if id != ticket_type.event_id => {
                    return Err(ServiceError::ValidationError(
                        "All tickets in an order must belong to the same event".to_string(),
                    ));
                }
                Some(_) => {}
            }

            let slots = Self::find_unclaimed_slots(txn, ticket_type.id, selection.quantity).await?;
            if (slots.len() as u32) < selection.quantity {
                return Err(ServiceError::InsufficientInventory {
                    name: ticket_type.name.clone(),
                    available: slots.len() as u64,
                    requested: selection.quantity as u64,
                });
            }

            allocations.push(AllocatedType {
                ticket_type,
                requested: selection.quantity,
                slots,
            });
        }

        let event_id = event_id.ok_or_else(|| {
            ServiceError::ValidationError("At least one ticket selection is required".to_string())
        })?;
        let event = EventEntity::find_by_id(event_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Event {}", event_id)))?;

        // 2. Resolve the customer inside the same transaction.
        let (customer, _created) = CustomerService::find_or_create_on(txn, request.customer).await?;

        // 3. Totals.
        let line_subtotal: Decimal = allocations
            .iter()
            .map(|a| a.ticket_type.price * Decimal::from(a.requested))
            .sum();
        let totals = order_totals(
            line_subtotal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        );

        // 4. Order row.
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_number = generate_order_number();

        let order_model = order::ActiveModel {
            id: Set(order_id),
            customer_id: Set(customer.id),
            order_number: Set(order_number.clone()),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_method: Set(Some(
                request
                    .payment_method
                    .unwrap_or_else(|| "credit_card".to_string()),
            )),
            payment_intent_id: Set(None),
            subtotal: Set(totals.subtotal),
            tax: Set(totals.tax),
            fees: Set(totals.fees),
            total: Set(totals.total),
            currency: Set(event.currency.clone()),
            customer_email: Set(customer.email.clone()),
            customer_first_name: Set(customer.first_name.clone()),
            customer_last_name: Set(customer.last_name.clone()),
            customer_phone: Set(customer.phone.clone()),
            completed_at: Set(None),
            cancelled_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        // 5. Items and claims.
        let mut tickets = Vec::new();
        for allocation in &allocations {
            let unit_price = allocation.ticket_type.price;
            let item_subtotal = (unit_price * Decimal::from(allocation.requested))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            let order_item_model = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                ticket_type_id: Set(allocation.ticket_type.id),
                quantity: Set(allocation.requested as i32),
                unit_price: Set(unit_price),
                subtotal: Set(item_subtotal),
                ticket_type_name: Set(allocation.ticket_type.name.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(txn)
            .await?;

            for slot in allocation.slots.iter().take(allocation.requested as usize) {
                let claimed = Self::claim_slot(
                    txn,
                    ClaimContext {
                        order_id,
                        order_item_id: order_item_model.id,
                        event: &event,
                        ticket_type: &allocation.ticket_type,
                        customer_id: customer.id,
                        slot_id: slot.id,
                    },
                )
                .await?;

                tickets.push(TicketSummary {
                    id: claimed.id,
                    ticket_code: claimed.ticket_code,
                    event_title: claimed.event_title,
                    ticket_type_name: claimed.ticket_type_name,
                    price: claimed.price,
                });
            }
        }

        // 6. Synthetic payment confirmation; real payment processing lives
        // outside this system.
        let mut completed: order::ActiveModel = order_model.into();
        completed.status = Set(OrderStatus::Completed);
        completed.payment_status = Set(PaymentStatus::Completed);
        completed.payment_intent_id = Set(Some(format!("pi_fake_{}", now.timestamp_millis())));
        completed.completed_at = Set(Some(Utc::now()));
        completed.updated_at = Set(Utc::now());
        completed.update(txn).await?;

        Ok(CreateOrderResult {
            order_id,
            order_number,
            customer_id: customer.id,
            subtotal: totals.subtotal,
            tax: totals.tax,
            fees: totals.fees,
            total: totals.total,
            currency: event.currency,
            tickets,
        })
    }

    /// Free slots for a ticket type: rows not referenced by any ticket.
    /// Reads without locking — results may be stale by the time the claim
    /// happens, and that is expected.
    async fn find_unclaimed_slots(
        txn: &DatabaseTransaction,
        ticket_type_id: Uuid,
        quantity: u32,
    ) -> Result<Vec<InventorySlotModel>, ServiceError> {
        let claimed_slot_ids = Query::select()
            .column(ticket::Column::InventorySlotId)
            .from(TicketEntity)
            .to_owned();

        let slots = InventorySlotEntity::find()
            .filter(inventory_slot::Column::TicketTypeId.eq(ticket_type_id))
            .filter(inventory_slot::Column::Id.not_in_subquery(claimed_slot_ids))
            .limit(quantity as u64)
            .all(txn)
            .await?;

        Ok(slots)
    }

    /// The claim primitive: inserting the ticket row is what takes the
    /// slot. The unique index on `inventory_slot_id` makes the insert fail
    /// for the second claimant no matter what discovery said; that failure
    /// is a definitive lost race, not a transient error. A collision on
    /// the generated `ticket_code` is the one retryable case.
    pub async fn claim_slot(
        txn: &DatabaseTransaction,
        ctx: ClaimContext<'_>,
    ) -> Result<ticket::Model, ServiceError> {
        for attempt in 0..TICKET_CODE_ATTEMPTS {
            let now = Utc::now();
            let ticket_code = generate_ticket_code();

            let candidate = ticket::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(ctx.order_id),
                order_item_id: Set(ctx.order_item_id),
                event_id: Set(ctx.event.id),
                ticket_type_id: Set(ctx.ticket_type.id),
                customer_id: Set(ctx.customer_id),
                inventory_slot_id: Set(ctx.slot_id),
                ticket_code: Set(ticket_code),
                status: Set(TicketStatus::Valid),
                attendee_first_name: Set(None),
                attendee_last_name: Set(None),
                attendee_email: Set(None),
                is_checked_in: Set(false),
                checked_in_at: Set(None),
                checked_in_by: Set(None),
                event_title: Set(ctx.event.title.clone()),
                ticket_type_name: Set(ctx.ticket_type.name.clone()),
                price: Set(ctx.ticket_type.price),
                created_at: Set(now),
                updated_at: Set(now),
            };

            match candidate.insert(txn).await {
                Ok(model) => return Ok(model),
                Err(err) => match classify_unique_violation(&err) {
                    Some(UniqueViolation::InventorySlot) => {
                        warn!(
                            slot_id = %ctx.slot_id,
                            ticket_type_id = %ctx.ticket_type.id,
                            "Lost claim race for inventory slot"
                        );
                        return Err(ServiceError::InventoryConflict(format!(
                            "inventory slot {} was claimed by a concurrent order",
                            ctx.slot_id
                        )));
                    }
                    Some(UniqueViolation::TicketCode) if attempt + 1 < TICKET_CODE_ATTEMPTS => {
                        warn!(attempt = attempt, "Ticket code collision, regenerating");
                        continue;
                    }
                    _ => return Err(ServiceError::DatabaseError(err)),
                },
            }
        }

        Err(ServiceError::InternalError(
            "exhausted ticket code generation attempts".to_string(),
        ))
    }

    /// Retrieves an order with its tickets (the confirmation payload).
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderDetails>, ServiceError> {
        let db = self.db_pool.as_ref();

        let Some(order_model) = OrderEntity::find_by_id(order_id).one(db).await? else {
            return Ok(None);
        };

        let tickets = TicketEntity::find()
            .filter(ticket::Column::OrderId.eq(order_id))
            .all(db)
            .await?
            .into_iter()
            .map(|t| OrderTicket {
                id: t.id,
                ticket_code: t.ticket_code,
                event_title: t.event_title,
                ticket_type_name: t.ticket_type_name,
                price: t.price,
                status: t.status,
            })
            .collect();

        Ok(Some(Self::order_details(order_model, tickets)))
    }

    /// Updates an order's status, stamping the matching lifecycle
    /// timestamp.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderModel, ServiceError> {
        let db = self.db_pool.as_ref();
        let now = Utc::now();

        let order_model = OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for status update");
                ServiceError::NotFound(format!("Order {}", order_id))
            })?;

        let old_status = order_model.status;

        let mut active: order::ActiveModel = order_model.into();
        active.status = Set(request.status);
        active.updated_at = Set(now);
        match request.status {
            OrderStatus::Completed => active.completed_at = Set(Some(now)),
            OrderStatus::Cancelled => active.cancelled_at = Set(Some(now)),
            _ => {}
        }

        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %request.status, "Order status updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status: old_status.to_string(),
                    new_status: request.status.to_string(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send order status changed event");
            }
        }

        Ok(updated)
    }

    /// Cancels an order
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let updated = self
            .update_order_status(
                order_id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Cancelled,
                },
            )
            .await?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order cancelled event");
            }
        }

        Ok(updated)
    }

    fn order_details(model: OrderModel, tickets: Vec<OrderTicket>) -> OrderDetails {
        OrderDetails {
            id: model.id,
            order_number: model.order_number,
            status: model.status,
            payment_status: model.payment_status,
            subtotal: model.subtotal,
            tax: model.tax,
            fees: model.fees,
            total: model.total,
            currency: model.currency,
            customer_email: model.customer_email,
            customer_first_name: model.customer_first_name,
            customer_last_name: model.customer_last_name,
            completed_at: model.completed_at,
            created_at: model.created_at,
            tickets,
        }
    }
}

/// Everything a single slot claim needs, borrowed from the surrounding
/// order placement.
pub struct ClaimContext<'a> {
    pub order_id: Uuid,
    pub order_item_id: Uuid,
    pub event: &'a EventModel,
    pub ticket_type: &'a TicketTypeModel,
    pub customer_id: Uuid,
    pub slot_id: Uuid,
}

enum UniqueViolation {
    InventorySlot,
    TicketCode,
    Other,
}

fn classify_unique_violation(err: &sea_orm::DbErr) -> Option<UniqueViolation> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            if message.contains("inventory_slot") {
                Some(UniqueViolation::InventorySlot)
            } else if message.contains("ticket_code") {
                Some(UniqueViolation::TicketCode)
            } else {
                Some(UniqueViolation::Other)
            }
        }
        _ => None,
    }
}

fn generate_order_number() -> String {
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), random_suffix(6))
}

fn generate_ticket_code() -> String {
    format!("TKT-{}-{}", Utc::now().timestamp_millis(), random_suffix(8))
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect()
}
