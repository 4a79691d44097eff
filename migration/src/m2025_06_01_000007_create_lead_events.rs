//! Migration to create the lead_events table (append-only audit log).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeadEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LeadEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LeadEvents::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(LeadEvents::EventType).text().not_null())
                    .col(ColumnDef::new(LeadEvents::Metadata).json_binary().not_null())
                    .col(
                        ColumnDef::new(LeadEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_events_business_id")
                            .from(LeadEvents::Table, LeadEvents::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lead_events_business_created")
                    .table(LeadEvents::Table)
                    .col(LeadEvents::BusinessId)
                    .col(LeadEvents::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LeadEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeadEvents {
    Table,
    Id,
    BusinessId,
    EventType,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
}
