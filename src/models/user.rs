use crate::entities::{aotd_user_entity as aotd_users, user_entity as users};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub discord_id: String,
    pub nickname: String,
    pub aotd_enrolled: bool,
}

impl From<users::Model> for UserResponse {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            discord_id: m.discord_id,
            nickname: m.nickname,
            aotd_enrolled: m.aotd_enrolled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollRequest {
    #[schema(example = "189734016587464704")]
    pub discord_id: String,
    #[schema(example = "rosen")]
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStreakData {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_review_date: Option<NaiveDate>,
    pub streak_at_risk: bool,
}

impl UserStreakData {
    pub fn from_profile(profile: &aotd_users::Model, today: NaiveDate) -> Self {
        Self {
            current_streak: profile.current_streak,
            longest_streak: profile.longest_streak,
            last_review_date: profile.last_review_date,
            streak_at_risk: profile.last_review_date != Some(today),
        }
    }
}
