// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub domain: String,
    pub feed_url: String,
    pub respect_robots: bool,
    pub delay_ms: i64,
    pub user_agent: String,
    pub timeout_ms: i64,
    pub content_selectors: Json,
    pub is_active: bool,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::scraped_content::Entity")]
    ScrapedContent,
}

impl Related<super::scraped_content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScrapedContent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
