use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "albums")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub catalog_id: String,
    pub title: String,
    pub artist: String,
    pub artist_url: Option<String>,
    pub cover_url: Option<String>,
    pub album_url: Option<String>,
    pub submitted_by: Option<i64>,
    pub user_comment: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub release_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
