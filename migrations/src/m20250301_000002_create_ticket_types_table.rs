use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TicketTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketTypes::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TicketTypes::EventId).uuid().not_null())
                    .col(ColumnDef::new(TicketTypes::Name).string().not_null())
                    .col(ColumnDef::new(TicketTypes::Description).text().null())
                    .col(
                        ColumnDef::new(TicketTypes::Price)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TicketTypes::Quantity).integer().not_null())
                    .col(ColumnDef::new(TicketTypes::SaleStartDate).timestamp().null())
                    .col(ColumnDef::new(TicketTypes::SaleEndDate).timestamp().null())
                    .col(
                        ColumnDef::new(TicketTypes::MinQuantityPerOrder)
                            .integer()
                            .null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(TicketTypes::MaxQuantityPerOrder)
                            .integer()
                            .null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(TicketTypes::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TicketTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(TicketTypes::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(TicketTypes::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_types_event_id")
                            .from(TicketTypes::Table, TicketTypes::EventId)
                            .to(
                                super::m20250301_000001_create_events_table::Events::Table,
                                super::m20250301_000001_create_events_table::Events::Id,
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
                    .name("idx_ticket_types_event_id")
                    .table(TicketTypes::Table)
                    .col(TicketTypes::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_types_event_id_sort_order")
                    .table(TicketTypes::Table)
                    .col(TicketTypes::EventId)
                    .col(TicketTypes::SortOrder)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TicketTypes {
    Table,
    Id,
    EventId,
    Name,
    Description,
    Price,
    Quantity,
    SaleStartDate,
    SaleEndDate,
    MinQuantityPerOrder,
    MaxQuantityPerOrder,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
