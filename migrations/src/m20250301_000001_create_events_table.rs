use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Events::Title).string().not_null())
                    .col(
                        ColumnDef::new(Events::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Events::Description).text().null())
                    .col(ColumnDef::new(Events::ShortDescription).string().null())
                    .col(ColumnDef::new(Events::StartDate).timestamp().not_null())
                    .col(ColumnDef::new(Events::EndDate).timestamp().null())
                    .col(
                        ColumnDef::new(Events::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .col(
                        ColumnDef::new(Events::Status)
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Events::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Events::PublishedAt).timestamp().null())
                    .col(ColumnDef::new(Events::TotalCapacity).integer().not_null())
                    .col(
                        ColumnDef::new(Events::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Events::Category).string().null())
                    .col(ColumnDef::new(Events::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Events::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Events {
    Table,
    Id,
    Title,
    Slug,
    Description,
    ShortDescription,
    StartDate,
    EndDate,
    Timezone,
    Status,
    IsPublished,
    PublishedAt,
    TotalCapacity,
    Currency,
    Category,
    CreatedAt,
    UpdatedAt,
}
