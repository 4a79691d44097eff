//! Migration to create the demo_calls table.
//!
//! Calls placed against a demo assistant before the business became a
//! customer. Keyed by `vapi_call_id` like customer calls.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DemoCalls::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DemoCalls::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DemoCalls::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(DemoCalls::VapiCallId).text().not_null())
                    .col(ColumnDef::new(DemoCalls::CallerNumber).text().null())
                    .col(
                        ColumnDef::new(DemoCalls::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DemoCalls::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DemoCalls::DurationSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DemoCalls::Transcript).json_binary().not_null())
                    .col(ColumnDef::new(DemoCalls::Summary).text().null())
                    .col(ColumnDef::new(DemoCalls::RecordingUrl).text().null())
                    .col(ColumnDef::new(DemoCalls::EndedReason).text().null())
                    .col(
                        ColumnDef::new(DemoCalls::Cost)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(DemoCalls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_demo_calls_business_id")
                            .from(DemoCalls::Table, DemoCalls::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_demo_calls_vapi_call_id")
                    .table(DemoCalls::Table)
                    .col(DemoCalls::VapiCallId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DemoCalls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DemoCalls {
    Table,
    Id,
    BusinessId,
    VapiCallId,
    CallerNumber,
    StartedAt,
    EndedAt,
    DurationSeconds,
    Transcript,
    Summary,
    RecordingUrl,
    EndedReason,
    Cost,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
}
