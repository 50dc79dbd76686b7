use crate::config::AotdConfig;
use crate::entities::outage_entity as outages;
use crate::error::{AppError, AppResult};
use crate::models::CreateOutageRequest;
use crate::services::UserService;
use crate::utils::today;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct OutageService {
    pool: DatabaseConnection,
    config: AotdConfig,
    user_service: UserService,
}

impl OutageService {
    pub fn new(pool: DatabaseConnection, config: AotdConfig, user_service: UserService) -> Self {
        Self {
            pool,
            config,
            user_service,
        }
    }

    /// Schedule an outage window for a user's submissions.
    ///
    /// Self-enacted outages must start with enough lead time that the chance
    /// numbers on the site stay meaningful; an admin can backdate freely.
    pub async fn create_outage(&self, req: &CreateOutageRequest) -> AppResult<outages::Model> {
        if req.end_date < req.start_date {
            return Err(AppError::ValidationError(
                "Outage end date is before its start date".to_string(),
            ));
        }

        let earliest_start = today() + Duration::days(self.config.outage_min_lead_days);
        if !req.admin_enacted && req.start_date < earliest_start {
            return Err(AppError::ValidationError(format!(
                "Outage must start at least {} days out ({earliest_start} or later)",
                self.config.outage_min_lead_days
            )));
        }

        let user = self.user_service.lookup_by_discord_id(&req.discord_id).await?;
        let admin_enactor = match (&req.admin_enacted, &req.admin_discord_id) {
            (true, Some(admin_id)) => {
                Some(self.user_service.lookup_by_discord_id(admin_id).await?.id)
            }
            _ => None,
        };

        let outage = outages::ActiveModel {
            user_id: Set(user.id),
            start_date: Set(req.start_date),
            end_date: Set(req.end_date),
            reason: Set(req.reason.clone()),
            admin_enacted: Set(req.admin_enacted),
            admin_enactor: Set(admin_enactor),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Outage created for user {} from {} to {} ({})",
            req.discord_id,
            outage.start_date,
            outage.end_date,
            outage.reason
        );
        Ok(outage)
    }

    pub async fn delete_outage(&self, id: i64) -> AppResult<()> {
        let outage = outages::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Outage {id} not found")))?;
        outage.delete(&self.pool).await?;
        log::info!("Outage {id} deleted");
        Ok(())
    }

    pub async fn list_outages(&self) -> AppResult<Vec<outages::Model>> {
        Ok(outages::Entity::find()
            .order_by_asc(outages::Column::StartDate)
            .all(&self.pool)
            .await?)
    }

    pub async fn outages_active_on(&self, date: NaiveDate) -> AppResult<Vec<outages::Model>> {
        Ok(outages::Entity::find()
            .filter(outages::Column::StartDate.lte(date))
            .filter(outages::Column::EndDate.gte(date))
            .all(&self.pool)
            .await?)
    }

    pub async fn active_outage_for(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> AppResult<Option<outages::Model>> {
        Ok(outages::Entity::find()
            .filter(outages::Column::UserId.eq(user_id))
            .filter(outages::Column::StartDate.lte(date))
            .filter(outages::Column::EndDate.gte(date))
            .one(&self.pool)
            .await?)
    }
}
