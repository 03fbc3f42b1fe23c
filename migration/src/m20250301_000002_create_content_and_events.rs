// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_sources_and_jobs::{ScrapingJobs, Sources};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapedContent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapedContent::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapedContent::SourceId).uuid().not_null())
                    .col(ColumnDef::new(ScrapedContent::JobId).uuid().null())
                    .col(
                        ColumnDef::new(ScrapedContent::SourceUrl)
                            .string_len(2048)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ScrapedContent::Title).text().not_null())
                    .col(ColumnDef::new(ScrapedContent::Body).text().not_null())
                    .col(ColumnDef::new(ScrapedContent::Author).string().null())
                    .col(
                        ColumnDef::new(ScrapedContent::PublishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ScrapedContent::Language).string_len(16).null())
                    .col(
                        ColumnDef::new(ScrapedContent::ContentHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ScrapedContent::QualityScore)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapedContent::ExtractionMethod)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapedContent::ProcessingStatus)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapedContent::CompressedPayload)
                            .binary()
                            .null(),
                    )
                    .col(ColumnDef::new(ScrapedContent::SelectorTraces).json().null())
                    .col(
                        ColumnDef::new(ScrapedContent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scraped_content_source")
                            .from(ScrapedContent::Table, ScrapedContent::SourceId)
                            .to(Sources::Table, Sources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scraped_content_job")
                            .from(ScrapedContent::Table, ScrapedContent::JobId)
                            .to(ScrapingJobs::Table, ScrapingJobs::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraped_content_source_created_at")
                    .table(ScrapedContent::Table)
                    .col(ScrapedContent::SourceId)
                    .col(ScrapedContent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraped_content_job_id")
                    .table(ScrapedContent::Table)
                    .col(ScrapedContent::JobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JobEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(JobEvents::JobId).uuid().not_null())
                    .col(ColumnDef::new(JobEvents::SourceId).uuid().null())
                    .col(ColumnDef::new(JobEvents::Severity).string().not_null())
                    .col(ColumnDef::new(JobEvents::EventType).string().not_null())
                    .col(ColumnDef::new(JobEvents::Message).text().not_null())
                    .col(ColumnDef::new(JobEvents::Payload).json().not_null())
                    .col(ColumnDef::new(JobEvents::CorrelationId).uuid().null())
                    .col(ColumnDef::new(JobEvents::Sequence).big_integer().not_null())
                    .col(
                        ColumnDef::new(JobEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_events_job")
                            .from(JobEvents::Table, JobEvents::JobId)
                            .to(ScrapingJobs::Table, ScrapingJobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_events_job_created_at")
                    .table(JobEvents::Table)
                    .col(JobEvents::JobId)
                    .col(JobEvents::CreatedAt)
                    .col(JobEvents::Sequence)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_events_correlation_id")
                    .table(JobEvents::Table)
                    .col(JobEvents::CorrelationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScrapedContent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapedContent {
    Table,
    Id,
    SourceId,
    JobId,
    SourceUrl,
    Title,
    Body,
    Author,
    PublishedAt,
    Language,
    ContentHash,
    QualityScore,
    ExtractionMethod,
    ProcessingStatus,
    CompressedPayload,
    SelectorTraces,
    CreatedAt,
}

#[derive(DeriveIden)]
enum JobEvents {
    Table,
    Id,
    JobId,
    SourceId,
    Severity,
    EventType,
    Message,
    Payload,
    CorrelationId,
    Sequence,
    CreatedAt,
}
