use crate::models::AlbumResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One rating-changing moment in a day's timeline. `Review` is a review's
/// final known state merged at its last-updated position; `FirstUpdate` /
/// `Update` are pre-edit snapshots stamped with the snapshot's own timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TimelineEventType {
    #[serde(rename = "Review")]
    Review,
    #[serde(rename = "First Update")]
    FirstUpdate,
    #[serde(rename = "Update")]
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimelineEvent {
    pub timestamp: DateTime<Utc>,
    /// Running album average as of this instant.
    pub value: f64,
    pub user_id: i64,
    pub user_discord_id: String,
    pub user_nickname: String,
    #[serde(rename = "type")]
    pub event_type: TimelineEventType,
    /// The raw score this event submitted.
    pub score: f64,
    pub review_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyPickResponse {
    pub date: NaiveDate,
    pub manual: bool,
    pub admin_message: Option<String>,
    /// None until finalized, or finalized with zero reviews.
    pub rating: Option<f64>,
    pub standard_deviation: Option<f64>,
    pub album: AlbumResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectAdminRequest {
    pub admin_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthPick {
    pub date: NaiveDate,
    pub rating: Option<f64>,
    pub album: AlbumResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitterSelectionCount {
    pub discord_id: String,
    pub count: u32,
    pub percent: f64,
    pub selection_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthStats {
    pub highest_aotd_date: Option<NaiveDate>,
    pub lowest_aotd_date: Option<NaiveDate>,
    pub selection_total: u32,
    pub selection_counts: Vec<SubmitterSelectionCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthViewResponse {
    pub picks: Vec<MonthPick>,
    pub stats: Option<MonthStats>,
    pub timestamp: DateTime<Utc>,
}
