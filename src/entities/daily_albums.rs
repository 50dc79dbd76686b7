use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// Freshly created picks carry [`RATING_PENDING`]; a finalized pick holds the
/// unrounded mean, or NULL when the day received no reviews.
pub const RATING_PENDING: f64 = 11.0;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "daily_albums")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub album_id: i64,
    pub date: NaiveDate,
    pub manual: bool,
    pub admin_message: Option<String>,
    pub rating: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub timeline: Option<Json>,
}

impl Model {
    /// True once the finalization step has run for this pick.
    pub fn is_finalized(&self) -> bool {
        self.rating != Some(RATING_PENDING)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
