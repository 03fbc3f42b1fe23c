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

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sources::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sources::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sources::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Sources::Domain).string().not_null())
                    .col(ColumnDef::new(Sources::FeedUrl).text().not_null())
                    .col(
                        ColumnDef::new(Sources::RespectRobots)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Sources::DelayMs)
                            .big_integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(ColumnDef::new(Sources::UserAgent).string().not_null())
                    .col(
                        ColumnDef::new(Sources::TimeoutMs)
                            .big_integer()
                            .not_null()
                            .default(30000),
                    )
                    .col(ColumnDef::new(Sources::ContentSelectors).json().not_null())
                    .col(
                        ColumnDef::new(Sources::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Sources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Sources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScrapingJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapingJobs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapingJobs::Status).string().not_null())
                    .col(ColumnDef::new(ScrapingJobs::SourceIds).json().not_null())
                    .col(
                        ColumnDef::new(ScrapingJobs::ArticlesPerSource)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::EnableTracking)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::TotalExtracted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::TotalSaved)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::TotalDuplicates)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::TotalErrors)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScrapingJobs::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(ScrapingJobs::TriggeredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScrapingJobs::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraping_jobs_triggered_at")
                    .table(ScrapingJobs::Table)
                    .col(ScrapingJobs::TriggeredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapingJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sources {
    Table,
    Id,
    Name,
    Domain,
    FeedUrl,
    RespectRobots,
    DelayMs,
    UserAgent,
    TimeoutMs,
    ContentSelectors,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ScrapingJobs {
    Table,
    Id,
    Status,
    SourceIds,
    ArticlesPerSource,
    EnableTracking,
    TotalExtracted,
    TotalSaved,
    TotalDuplicates,
    TotalErrors,
    ErrorMessage,
    TriggeredAt,
    StartedAt,
    CompletedAt,
}
