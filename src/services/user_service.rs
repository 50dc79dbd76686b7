use crate::entities::{aotd_user_entity as aotd_users, user_entity as users};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

/// The user directory: lookups by Discord id and AOtD enrollment. Account
/// creation itself happens upstream (Discord OAuth); this service only
/// mirrors what the core needs.
#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn lookup_by_discord_id(&self, discord_id: &str) -> AppResult<users::Model> {
        users::Entity::find()
            .filter(users::Column::DiscordId.eq(discord_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {discord_id} not found")))
    }

    /// Enroll a user into AOtD: creates the user row if the directory has
    /// never seen them, then their participation record. Idempotent.
    pub async fn enroll(&self, discord_id: &str, nickname: &str) -> AppResult<users::Model> {
        let user = match users::Entity::find()
            .filter(users::Column::DiscordId.eq(discord_id))
            .one(&self.pool)
            .await?
        {
            Some(existing) => {
                if existing.aotd_enrolled {
                    existing
                } else {
                    let mut am = existing.into_active_model();
                    am.aotd_enrolled = Set(true);
                    am.update(&self.pool).await?
                }
            }
            None => {
                users::ActiveModel {
                    discord_id: Set(discord_id.to_string()),
                    nickname: Set(nickname.to_string()),
                    aotd_enrolled: Set(true),
                    created_at: Set(Some(Utc::now())),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };

        if aotd_users::Entity::find_by_id(user.id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            aotd_users::ActiveModel {
                user_id: Set(user.id),
                selection_blocked_flag: Set(false),
                current_streak: Set(0),
                longest_streak: Set(0),
                last_review_date: Set(None),
                total_reviews: Set(0),
                review_score_average: Set(None),
                created_at: Set(Some(Utc::now())),
            }
            .insert(&self.pool)
            .await?;
            log::info!("Enrolled user {discord_id} into album of the day");
        }

        Ok(user)
    }

    pub async fn participants(&self) -> AppResult<Vec<aotd_users::Model>> {
        Ok(aotd_users::Entity::find().all(&self.pool).await?)
    }

    pub async fn profile_for(&self, discord_id: &str) -> AppResult<aotd_users::Model> {
        let user = self.lookup_by_discord_id(discord_id).await?;
        aotd_users::Entity::find_by_id(user.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User {discord_id} is not enrolled in album of the day"))
            })
    }
}
