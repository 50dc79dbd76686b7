use crate::entities::outage_entity as outages;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOutageRequest {
    #[schema(example = "189734016587464704")]
    pub discord_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[schema(example = "vacation")]
    pub reason: String,
    #[serde(default)]
    pub admin_enacted: bool,
    pub admin_discord_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutageResponse {
    pub id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub admin_enacted: bool,
}

impl From<outages::Model> for OutageResponse {
    fn from(m: outages::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            start_date: m.start_date,
            end_date: m.end_date,
            reason: m.reason,
            admin_enacted: m.admin_enacted,
        }
    }
}
