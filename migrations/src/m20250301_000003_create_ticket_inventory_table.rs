use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per sellable unit. Rows are written once, at ticket type
        // creation, and never updated; "claimed" is expressed solely by a
        // tickets row referencing the slot.
        manager
            .create_table(
                Table::create()
                    .table(TicketInventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketInventory::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketInventory::TicketTypeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketInventory::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_inventory_ticket_type_id")
                            .from(TicketInventory::Table, TicketInventory::TicketTypeId)
                            .to(
                                super::m20250301_000002_create_ticket_types_table::TicketTypes::Table,
                                super::m20250301_000002_create_ticket_types_table::TicketTypes::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_inventory_ticket_type_id")
                    .table(TicketInventory::Table)
                    .col(TicketInventory::TicketTypeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketInventory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TicketInventory {
    Table,
    Id,
    TicketTypeId,
    CreatedAt,
}
