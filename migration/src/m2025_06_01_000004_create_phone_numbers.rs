//! Migration to create the phone_numbers table.
//!
//! Each row is a 46elks number bought for a production business, paired with
//! the number registered at the voice-AI provider that calls are forwarded to.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PhoneNumbers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhoneNumbers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PhoneNumbers::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(PhoneNumbers::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(PhoneNumbers::Number).text().not_null())
                    .col(ColumnDef::new(PhoneNumbers::ElksNumberId).text().not_null())
                    .col(ColumnDef::new(PhoneNumbers::VapiPhoneNumberId).text().null())
                    .col(ColumnDef::new(PhoneNumbers::ForwardingNumber).text().not_null())
                    .col(
                        ColumnDef::new(PhoneNumbers::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(PhoneNumbers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PhoneNumbers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phone_numbers_business_id")
                            .from(PhoneNumbers::Table, PhoneNumbers::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phone_numbers_customer_id")
                            .from(PhoneNumbers::Table, PhoneNumbers::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phone_numbers_number")
                    .table(PhoneNumbers::Table)
                    .col(PhoneNumbers::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phone_numbers_customer_id")
                    .table(PhoneNumbers::Table)
                    .col(PhoneNumbers::CustomerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PhoneNumbers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PhoneNumbers {
    Table,
    Id,
    BusinessId,
    CustomerId,
    Number,
    ElksNumberId,
    VapiPhoneNumberId,
    ForwardingNumber,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}
