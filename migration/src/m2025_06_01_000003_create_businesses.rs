//! Migration to create the businesses table.
//!
//! Businesses are created by the lead pipeline from a submitted URL and carry
//! scraped content, extracted profile fields and the pipeline status.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Businesses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Businesses::Name).text().null())
                    .col(ColumnDef::new(Businesses::Slug).text().null())
                    .col(ColumnDef::new(Businesses::WebsiteUrl).text().not_null())
                    .col(ColumnDef::new(Businesses::Industry).text().null())
                    .col(ColumnDef::new(Businesses::Description).text().null())
                    .col(ColumnDef::new(Businesses::Address).text().null())
                    .col(ColumnDef::new(Businesses::Phone).text().null())
                    .col(ColumnDef::new(Businesses::Email).text().null())
                    .col(ColumnDef::new(Businesses::Services).json_binary().null())
                    .col(ColumnDef::new(Businesses::OpeningHours).json_binary().null())
                    .col(ColumnDef::new(Businesses::ScrapedMarkdown).text().null())
                    .col(
                        ColumnDef::new(Businesses::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Businesses::VapiAssistantId).text().null())
                    .col(ColumnDef::new(Businesses::VoiceId).text().null())
                    .col(ColumnDef::new(Businesses::CustomerId).uuid().null())
                    .col(ColumnDef::new(Businesses::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(Businesses::EmailSentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Businesses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Businesses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_businesses_customer_id")
                            .from(Businesses::Table, Businesses::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_businesses_slug")
                    .table(Businesses::Table)
                    .col(Businesses::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_businesses_website_url")
                    .table(Businesses::Table)
                    .col(Businesses::WebsiteUrl)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_businesses_status_created")
                    .table(Businesses::Table)
                    .col(Businesses::Status)
                    .col(Businesses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_businesses_vapi_assistant_id")
                    .table(Businesses::Table)
                    .col(Businesses::VapiAssistantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Businesses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
    Name,
    Slug,
    WebsiteUrl,
    Industry,
    Description,
    Address,
    Phone,
    Email,
    Services,
    OpeningHours,
    ScrapedMarkdown,
    Status,
    VapiAssistantId,
    VoiceId,
    CustomerId,
    ErrorMessage,
    EmailSentAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}
