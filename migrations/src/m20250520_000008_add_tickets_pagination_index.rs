use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Composite index backing keyset pagination over tickets.
        // Matches ORDER BY created_at DESC, id DESC so forward pages are a
        // pure index range scan; without it the listing degrades to a sort.
        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_created_at_id")
                    .table(Tickets::Table)
                    .col((Tickets::CreatedAt, IndexOrder::Desc))
                    .col((Tickets::Id, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_tickets_created_at_id")
                    .table(Tickets::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    CreatedAt,
    Id,
}
