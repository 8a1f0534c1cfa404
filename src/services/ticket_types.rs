use crate::{
    db::DbPool,
    entities::{
        event::Entity as EventEntity,
        inventory_slot::{self, Entity as InventorySlotEntity},
        ticket::{self, Entity as TicketEntity},
        ticket_type::{self, Entity as TicketTypeEntity, Model as TicketTypeModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTicketTypeRequest {
    pub event_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub sale_start_date: Option<DateTime<Utc>>,
    pub sale_end_date: Option<DateTime<Utc>>,
    pub min_quantity_per_order: Option<i32>,
    pub max_quantity_per_order: Option<i32>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// A ticket type as the storefront sees it: sale window already checked,
/// availability derived from unclaimed slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableTicketType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub quantity_available: u64,
    pub sale_start_date: Option<DateTime<Utc>>,
    pub sale_end_date: Option<DateTime<Utc>>,
    pub min_quantity_per_order: Option<i32>,
    pub max_quantity_per_order: Option<i32>,
    pub sort_order: i32,
}

/// Service for managing ticket types and their inventory slots
#[derive(Clone)]
pub struct TicketTypeService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl TicketTypeService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a ticket type and provisions its inventory.
    ///
    /// This is the only place inventory slots are created: one row per
    /// sellable unit, inserted in the same transaction as the type itself.
    /// The `quantity` column is advisory from here on — capacity questions
    /// are answered by counting slots.
    #[instrument(skip(self, request), fields(event_id = %request.event_id, name = %request.name))]
    pub async fn create_ticket_type(
        &self,
        request: CreateTicketTypeRequest,
    ) -> Result<TicketTypeModel, ServiceError> {
        request.validate()?;

        let db = self.db_pool.as_ref();

        EventEntity::find_by_id(request.event_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                warn!(event_id = %request.event_id, "Event not found for ticket type creation");
                ServiceError::NotFound(format!("Event {}", request.event_id))
            })?;

        let now = Utc::now();
        let ticket_type_id = Uuid::new_v4();
        let slot_count = request.quantity;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for ticket type creation");
            ServiceError::DatabaseError(e)
        })?;

        let ticket_type = ticket_type::ActiveModel {
            id: Set(ticket_type_id),
            event_id: Set(request.event_id),
            name: Set(request.name),
            description: Set(request.description),
            price: Set(request.price),
            quantity: Set(request.quantity),
            sale_start_date: Set(request.sale_start_date),
            sale_end_date: Set(request.sale_end_date),
            min_quantity_per_order: Set(request.min_quantity_per_order.or(Some(1))),
            max_quantity_per_order: Set(request.max_quantity_per_order.or(Some(10))),
            sort_order: Set(request.sort_order.unwrap_or(0)),
            is_active: Set(request.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = ticket_type.insert(&txn).await.map_err(|e| {
            error!(error = %e, ticket_type_id = %ticket_type_id, "Failed to create ticket type");
            ServiceError::DatabaseError(e)
        })?;

        let slots = (0..slot_count).map(|_| inventory_slot::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_type_id: Set(ticket_type_id),
            created_at: Set(now),
        });

        InventorySlotEntity::insert_many(slots)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, ticket_type_id = %ticket_type_id, "Failed to provision inventory slots");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, ticket_type_id = %ticket_type_id, "Failed to commit ticket type creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            ticket_type_id = %ticket_type_id,
            slots = slot_count,
            "Ticket type created with provisioned inventory"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::InventoryProvisioned {
                    ticket_type_id,
                    slots: slot_count as u64,
                })
                .await
            {
                warn!(error = %e, ticket_type_id = %ticket_type_id, "Failed to send inventory provisioned event");
            }
        }

        Ok(created)
    }

    /// Retrieves a ticket type by ID
    #[instrument(skip(self), fields(ticket_type_id = %ticket_type_id))]
    pub async fn get_ticket_type(
        &self,
        ticket_type_id: Uuid,
    ) -> Result<Option<TicketTypeModel>, ServiceError> {
        let ticket_type = TicketTypeEntity::find_by_id(ticket_type_id)
            .one(self.db_pool.as_ref())
            .await?;
        Ok(ticket_type)
    }

    /// Unclaimed-slot count for one ticket type.
    ///
    /// Tickets only ever reference slots of their own type, so availability
    /// is the slot count minus the ticket count — no row scan needed.
    #[instrument(skip(self), fields(ticket_type_id = %ticket_type_id))]
    pub async fn available_slots(&self, ticket_type_id: Uuid) -> Result<u64, ServiceError> {
        let db = self.db_pool.as_ref();

        let slots = InventorySlotEntity::find()
            .filter(inventory_slot::Column::TicketTypeId.eq(ticket_type_id))
            .count(db)
            .await?;

        let claimed = TicketEntity::find()
            .filter(ticket::Column::TicketTypeId.eq(ticket_type_id))
            .count(db)
            .await?;

        Ok(slots.saturating_sub(claimed))
    }

    /// Ticket types for an event that are on sale right now: active, inside
    /// their sale window, with at least one unclaimed slot.
    #[instrument(skip(self), fields(event_id = %event_id))]
    pub async fn list_available(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<AvailableTicketType>, ServiceError> {
        let db = self.db_pool.as_ref();
        let now = Utc::now();

        let ticket_types = TicketTypeEntity::find()
            .filter(ticket_type::Column::EventId.eq(event_id))
            .filter(ticket_type::Column::IsActive.eq(true))
            .order_by_asc(ticket_type::Column::SortOrder)
            .all(db)
            .await?;

        let mut available = Vec::with_capacity(ticket_types.len());
        for tt in ticket_types {
            if tt.sale_start_date.is_some_and(|start| start > now) {
                continue;
            }
            if tt.sale_end_date.is_some_and(|end| end < now) {
                continue;
            }

            let quantity_available = self.available_slots(tt.id).await?;
            if quantity_available == 0 {
                continue;
            }

            available.push(AvailableTicketType {
                id: tt.id,
                name: tt.name,
                description: tt.description,
                price: tt.price,
                quantity: tt.quantity,
                quantity_available,
                sale_start_date: tt.sale_start_date,
                sale_end_date: tt.sale_end_date,
                min_quantity_per_order: tt.min_quantity_per_order,
                max_quantity_per_order: tt.max_quantity_per_order,
                sort_order: tt.sort_order,
            });
        }

        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(quantity: i32) -> CreateTicketTypeRequest {
        CreateTicketTypeRequest {
            event_id: Uuid::new_v4(),
            name: "General Admission".into(),
            description: None,
            price: dec!(25.00),
            quantity,
            sale_start_date: None,
            sale_end_date: None,
            min_quantity_per_order: None,
            max_quantity_per_order: None,
            sort_order: None,
            is_active: None,
        }
    }

    #[test]
    fn rejects_zero_quantity() {
        assert!(request(0).validate().is_err());
        assert!(request(100).validate().is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let mut bad = request(10);
        bad.name = String::new();
        assert!(bad.validate().is_err());
    }
}
