use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Customers::UserId).string().null())
                    .col(ColumnDef::new(Customers::FirstName).string().not_null())
                    .col(ColumnDef::new(Customers::LastName).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string().null())
                    .col(ColumnDef::new(Customers::BillingAddressLine1).string().null())
                    .col(ColumnDef::new(Customers::BillingAddressLine2).string().null())
                    .col(ColumnDef::new(Customers::BillingCity).string().null())
                    .col(ColumnDef::new(Customers::BillingState).string().null())
                    .col(ColumnDef::new(Customers::BillingCountry).string().null())
                    .col(ColumnDef::new(Customers::BillingPostalCode).string().null())
                    .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Customers::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    UserId,
    FirstName,
    LastName,
    Email,
    Phone,
    BillingAddressLine1,
    BillingAddressLine2,
    BillingCity,
    BillingState,
    BillingCountry,
    BillingPostalCode,
    CreatedAt,
    UpdatedAt,
}
