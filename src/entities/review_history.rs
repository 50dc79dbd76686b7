use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// Append-only pre-edit snapshot. `last_updated` is the timestamp the
/// snapshotted version was itself created/edited; `recorded_at` is when the
/// superseding edit happened. Rows are never mutated after creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub review_id: i64,
    pub aotd_date: NaiveDate,
    pub score: f64,
    pub review_text: Option<String>,
    pub first_listen: bool,
    pub last_updated: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
