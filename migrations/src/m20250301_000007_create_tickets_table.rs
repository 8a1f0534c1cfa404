use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tickets::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Tickets::OrderId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::OrderItemId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::EventId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::TicketTypeId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::InventorySlotId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::TicketCode).string().not_null())
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string()
                            .not_null()
                            .default("valid"),
                    )
                    .col(ColumnDef::new(Tickets::AttendeeFirstName).string().null())
                    .col(ColumnDef::new(Tickets::AttendeeLastName).string().null())
                    .col(ColumnDef::new(Tickets::AttendeeEmail).string().null())
                    .col(
                        ColumnDef::new(Tickets::IsCheckedIn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Tickets::CheckedInAt).timestamp().null())
                    .col(ColumnDef::new(Tickets::CheckedInBy).string().null())
                    .col(ColumnDef::new(Tickets::EventTitle).string().not_null())
                    .col(ColumnDef::new(Tickets::TicketTypeName).string().not_null())
                    .col(ColumnDef::new(Tickets::Price).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Tickets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tickets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_order_id")
                            .from(Tickets::Table, Tickets::OrderId)
                            .to(
                                super::m20250301_000005_create_orders_table::Orders::Table,
                                super::m20250301_000005_create_orders_table::Orders::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_order_item_id")
                            .from(Tickets::Table, Tickets::OrderItemId)
                            .to(
                                super::m20250301_000006_create_order_items_table::OrderItems::Table,
                                super::m20250301_000006_create_order_items_table::OrderItems::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_event_id")
                            .from(Tickets::Table, Tickets::EventId)
                            .to(
                                super::m20250301_000001_create_events_table::Events::Table,
                                super::m20250301_000001_create_events_table::Events::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_ticket_type_id")
                            .from(Tickets::Table, Tickets::TicketTypeId)
                            .to(
                                super::m20250301_000002_create_ticket_types_table::TicketTypes::Table,
                                super::m20250301_000002_create_ticket_types_table::TicketTypes::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_customer_id")
                            .from(Tickets::Table, Tickets::CustomerId)
                            .to(
                                super::m20250301_000004_create_customers_table::Customers::Table,
                                super::m20250301_000004_create_customers_table::Customers::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_inventory_slot_id")
                            .from(Tickets::Table, Tickets::InventorySlotId)
                            .to(
                                super::m20250301_000003_create_ticket_inventory_table::TicketInventory::Table,
                                super::m20250301_000003_create_ticket_inventory_table::TicketInventory::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The claim arbiter: two tickets can never reference the same slot.
        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_inventory_slot_id")
                    .table(Tickets::Table)
                    .col(Tickets::InventorySlotId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_ticket_code")
                    .table(Tickets::Table)
                    .col(Tickets::TicketCode)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Tickets {
    Table,
    Id,
    OrderId,
    OrderItemId,
    EventId,
    TicketTypeId,
    CustomerId,
    InventorySlotId,
    TicketCode,
    Status,
    AttendeeFirstName,
    AttendeeLastName,
    AttendeeEmail,
    IsCheckedIn,
    CheckedInAt,
    CheckedInBy,
    EventTitle,
    TicketTypeName,
    Price,
    CreatedAt,
    UpdatedAt,
}
