use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pricing tier for an event ("VIP", "General Admission", ...).
///
/// `quantity` records how many inventory slots were provisioned at creation
/// time and is advisory afterwards; availability is always derived from the
/// count of unclaimed `inventory_slot` rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub quantity: i32,
    #[sea_orm(nullable)]
    pub sale_start_date: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub sale_end_date: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub min_quantity_per_order: Option<i32>,
    #[sea_orm(nullable)]
    pub max_quantity_per_order: Option<i32>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    #[sea_orm(has_many = "super::inventory_slot::Entity")]
    InventorySlots,
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::inventory_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventorySlots.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
