use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// One row per (album, user, AOtD day). Edits mutate the row in place after
/// snapshotting it into review_history; `last_updated == review_date` iff the
/// review has never been edited.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub album_id: i64,
    pub user_id: i64,
    pub aotd_date: NaiveDate,
    pub score: f64,
    pub review_text: Option<String>,
    pub first_listen: bool,
    pub review_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: i32,
}

impl Model {
    pub fn is_edited(&self) -> bool {
        self.last_updated != self.review_date
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
