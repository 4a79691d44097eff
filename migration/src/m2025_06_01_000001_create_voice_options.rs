//! Migration to create the voice_options reference table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VoiceOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoiceOptions::Id)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VoiceOptions::Name).text().not_null())
                    .col(ColumnDef::new(VoiceOptions::Provider).text().not_null())
                    .col(ColumnDef::new(VoiceOptions::Gender).text().null())
                    .col(ColumnDef::new(VoiceOptions::Language).text().not_null())
                    .col(ColumnDef::new(VoiceOptions::Description).text().null())
                    .col(
                        ColumnDef::new(VoiceOptions::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VoiceOptions::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VoiceOptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VoiceOptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VoiceOptions {
    Table,
    Id,
    Name,
    Provider,
    Gender,
    Language,
    Description,
    IsDefault,
    SortOrder,
    CreatedAt,
}
