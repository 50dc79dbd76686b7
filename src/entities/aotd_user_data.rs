use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// Per-participant AOtD bookkeeping: selection eligibility flag, review
/// streaks, and cached review stats.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "aotd_user_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub selection_blocked_flag: bool,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_review_date: Option<NaiveDate>,
    pub total_reviews: i32,
    pub review_score_average: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
