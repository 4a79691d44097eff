//! Migration to create the customer_calls table.
//!
//! Completed inbound calls for production customers. `vapi_call_id` is unique
//! so a redelivered end-of-call report updates the existing row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerCalls::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerCalls::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustomerCalls::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(CustomerCalls::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(CustomerCalls::VapiCallId).text().not_null())
                    .col(ColumnDef::new(CustomerCalls::CallerNumber).text().null())
                    .col(ColumnDef::new(CustomerCalls::CallerName).text().null())
                    .col(
                        ColumnDef::new(CustomerCalls::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CustomerCalls::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CustomerCalls::DurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CustomerCalls::Transcript).json_binary().not_null())
                    .col(ColumnDef::new(CustomerCalls::Summary).text().null())
                    .col(ColumnDef::new(CustomerCalls::Sentiment).text().null())
                    .col(ColumnDef::new(CustomerCalls::ActionItems).json_binary().not_null())
                    .col(ColumnDef::new(CustomerCalls::RecordingUrl).text().null())
                    .col(ColumnDef::new(CustomerCalls::EndedReason).text().null())
                    .col(
                        ColumnDef::new(CustomerCalls::Cost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CustomerCalls::WhatsappSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CustomerCalls::TelegramSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CustomerCalls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CustomerCalls::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_calls_customer_id")
                            .from(CustomerCalls::Table, CustomerCalls::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_calls_business_id")
                            .from(CustomerCalls::Table, CustomerCalls::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customer_calls_vapi_call_id")
                    .table(CustomerCalls::Table)
                    .col(CustomerCalls::VapiCallId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_customer_calls_customer_created")
                    .table(CustomerCalls::Table)
                    .col(CustomerCalls::CustomerId)
                    .col(CustomerCalls::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerCalls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CustomerCalls {
    Table,
    Id,
    CustomerId,
    BusinessId,
    VapiCallId,
    CallerNumber,
    CallerName,
    StartedAt,
    EndedAt,
    DurationSeconds,
    Transcript,
    Summary,
    Sentiment,
    ActionItems,
    RecordingUrl,
    EndedReason,
    Cost,
    WhatsappSent,
    TelegramSent,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
}
