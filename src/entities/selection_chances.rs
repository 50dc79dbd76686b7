use crate::models::BlockType;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Cached selection chance per participant, recomputed by the batch refresh
/// job rather than on read.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "selection_chances")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub chance_percentage: f64,
    pub block_type: Option<BlockType>,
    pub outage_id: Option<i64>,
    pub reason: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
