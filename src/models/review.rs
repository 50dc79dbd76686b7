use crate::entities::{review_entity as reviews, review_history_entity as history};
use crate::models::UserStreakData;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    #[schema(example = "189734016587464704")]
    pub discord_id: String,
    #[schema(example = "9b9e5dd3-5b93-3a5b-aee0-72f04f88bb1b")]
    pub album_id: String,
    #[schema(example = 7.5)]
    pub score: f64,
    pub comment: Option<String>,
    #[serde(default)]
    pub first_listen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub user_id: i64,
    pub aotd_date: NaiveDate,
    pub score: f64,
    pub review_text: Option<String>,
    pub first_listen: bool,
    pub review_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_streak_data: Option<UserStreakData>,
}

impl From<reviews::Model> for ReviewResponse {
    fn from(m: reviews::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            aotd_date: m.aotd_date,
            score: m.score,
            review_text: m.review_text,
            first_listen: m.first_listen,
            review_date: m.review_date,
            last_updated: m.last_updated,
            version: m.version,
            user_streak_data: None,
        }
    }
}

/// One entry of a review's edit trail, newest first; the current version is
/// prepended with `recorded_at == last_updated`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewVersionResponse {
    pub score: f64,
    pub review_text: Option<String>,
    pub first_listen: bool,
    pub last_updated: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl From<history::Model> for ReviewVersionResponse {
    fn from(m: history::Model) -> Self {
        Self {
            score: m.score,
            review_text: m.review_text,
            first_listen: m.first_listen,
            last_updated: m.last_updated,
            recorded_at: m.recorded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewHistoryResponse {
    pub review: ReviewResponse,
    pub historical: Vec<ReviewVersionResponse>,
}
