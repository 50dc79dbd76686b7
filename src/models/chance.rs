use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Why a user's submissions are excluded from selection. Absent = eligible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum BlockType {
    #[sea_orm(string_value = "OUTAGE")]
    #[serde(rename = "OUTAGE")]
    Outage,
    #[sea_orm(string_value = "INACTIVITY")]
    #[serde(rename = "INACTIVITY")]
    Inactivity,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChanceResponse {
    pub discord_id: String,
    pub percentage: f64,
    pub block_type: Option<BlockType>,
    pub reason: Option<String>,
    pub outage_id: Option<i64>,
}
