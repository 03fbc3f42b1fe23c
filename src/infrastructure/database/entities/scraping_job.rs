// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scraping_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: String,
    pub source_ids: Json,
    pub articles_per_source: i32,
    pub enable_tracking: bool,
    pub total_extracted: i32,
    pub total_saved: i32,
    pub total_duplicates: i32,
    pub total_errors: i32,
    pub error_message: Option<String>,
    pub triggered_at: ChronoDateTimeWithTimeZone,
    pub started_at: Option<ChronoDateTimeWithTimeZone>,
    pub completed_at: Option<ChronoDateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::job_event::Entity")]
    JobEvent,
}

impl Related<super::job_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
