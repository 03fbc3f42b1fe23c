// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub source_id: Option<Uuid>,
    pub severity: String,
    pub event_type: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub payload: Json,
    pub correlation_id: Option<Uuid>,
    pub sequence: i64,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scraping_job::Entity",
        from = "Column::JobId",
        to = "super::scraping_job::Column::Id"
    )]
    ScrapingJob,
}

impl Related<super::scraping_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScrapingJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
