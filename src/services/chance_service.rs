use crate::config::AotdConfig;
use crate::entities::{
    album_entity as albums, aotd_user_entity as aotd_users, daily_album_entity as daily_albums,
    outage_entity as outages, review_entity as reviews, selection_chance_entity as chances,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{BlockType, ChanceResponse};
use crate::utils::{next_midnight, round2, today, tomorrow};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct ChanceService {
    pool: DatabaseConnection,
    config: AotdConfig,
}

impl ChanceService {
    pub fn new(pool: DatabaseConnection, config: AotdConfig) -> Self {
        Self { pool, config }
    }

    /// Re-evaluate one participant's selection eligibility flag.
    ///
    /// The window ends at the upcoming midnight rather than now, so a user
    /// whose last review is about to age out already shows as blocked on the
    /// site before the cutover. An active outage takes precedence and leaves
    /// the inactivity flag untouched.
    pub async fn refresh_blocked_flag(&self, profile: &aotd_users::Model) -> AppResult<bool> {
        if self
            .active_outage_for(profile.user_id, tomorrow())
            .await?
            .is_some()
        {
            log::debug!("User {} is under an outage", profile.user_id);
            return Ok(profile.selection_blocked_flag);
        }

        let window_start = next_midnight() - Duration::days(self.config.inactivity_window_days);
        let recent = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(profile.user_id))
            .filter(reviews::Column::ReviewDate.gte(window_start))
            .one(&self.pool)
            .await?;
        let blocked = recent.is_none();

        if profile.selection_blocked_flag != blocked {
            log::info!(
                "Changing selection_blocked_flag to {blocked} for user {}",
                profile.user_id
            );
            let mut am = profile.clone().into_active_model();
            am.selection_blocked_flag = Set(blocked);
            am.update(&self.pool).await?;
        }
        Ok(blocked)
    }

    /// Refresh every participant's flag. Run in bulk before each selection
    /// and chance calculation.
    pub async fn refresh_all_blocked_flags(&self) -> AppResult<()> {
        for profile in aotd_users::Entity::find().all(&self.pool).await? {
            self.refresh_blocked_flag(&profile).await?;
        }
        Ok(())
    }

    /// Batch job: recompute and cache every participant's chance of having
    /// a submission selected.
    ///
    /// 1. Refresh all eligibility flags
    /// 2. An outage-blocked user caches 0% with the outage's reason
    /// 3. An inactivity-blocked user caches 0% with days-since-last-review
    /// 4. Everyone else gets their share of unpicked submissions among
    ///    non-blocked users, rounded to two decimals (0 when nobody has an
    ///    eligible submission)
    pub async fn refresh_all_chances(&self) -> AppResult<()> {
        self.refresh_all_blocked_flags().await?;

        let day = today();
        let window_start = day - Duration::days(self.config.no_repeat_window_days);
        let profiles = aotd_users::Entity::find().all(&self.pool).await?;

        let outage_map = self.outages_by_user(tomorrow()).await?;
        let eligible_counts = self.eligible_counts(window_start).await?;

        let total_eligible: i64 = profiles
            .iter()
            .filter(|p| !p.selection_blocked_flag && !outage_map.contains_key(&p.user_id))
            .map(|p| eligible_counts.get(&p.user_id).copied().unwrap_or(0))
            .sum();

        for profile in &profiles {
            log::debug!("Calculating chance percentage for user {}", profile.user_id);

            let (percentage, block_type, outage_id, reason) =
                if let Some(outage) = outage_map.get(&profile.user_id) {
                    (
                        0.0,
                        Some(BlockType::Outage),
                        Some(outage.id),
                        Some(outage.reason.clone()),
                    )
                } else if profile.selection_blocked_flag {
                    let days_since = self.days_since_last_review(profile.user_id, day).await?;
                    (
                        0.0,
                        Some(BlockType::Inactivity),
                        None,
                        Some(format!(
                            "Inactivity, user has not reviewed in the last {} days. Last review was {} days ago.",
                            self.config.inactivity_window_days, days_since
                        )),
                    )
                } else {
                    let user_eligible =
                        eligible_counts.get(&profile.user_id).copied().unwrap_or(0);
                    let percentage = if total_eligible > 0 {
                        round2(user_eligible as f64 / total_eligible as f64 * 100.0)
                    } else {
                        0.0
                    };
                    (percentage, None, None, None)
                };

            self.upsert_cache(profile.user_id, percentage, block_type, outage_id, reason)
                .await?;
        }
        Ok(())
    }

    /// Cached chance for a user; never recomputes inline.
    pub async fn get_chance(&self, discord_id: &str) -> AppResult<ChanceResponse> {
        let user = users::Entity::find()
            .filter(users::Column::DiscordId.eq(discord_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {discord_id} not found")))?;

        let cached = chances::Entity::find()
            .filter(chances::Column::UserId.eq(user.id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Selection chances not yet calculated for {discord_id}"
                ))
            })?;

        Ok(ChanceResponse {
            discord_id: user.discord_id,
            percentage: cached.chance_percentage,
            block_type: cached.block_type,
            reason: cached.reason,
            outage_id: cached.outage_id,
        })
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

    /// Users whose submissions are excluded from a draw on `date`: anyone
    /// flagged as blocked (refresh the flags first) or under an outage
    /// covering the date.
    pub async fn blocked_user_ids(&self, date: NaiveDate) -> AppResult<HashSet<i64>> {
        let mut blocked: HashSet<i64> = aotd_users::Entity::find()
            .filter(aotd_users::Column::SelectionBlockedFlag.eq(true))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| p.user_id)
            .collect();

        blocked.extend(
            outages::Entity::find()
                .filter(outages::Column::StartDate.lte(date))
                .filter(outages::Column::EndDate.gte(date))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|o| o.user_id),
        );
        Ok(blocked)
    }

    async fn outages_by_user(
        &self,
        date: NaiveDate,
    ) -> AppResult<HashMap<i64, outages::Model>> {
        Ok(outages::Entity::find()
            .filter(outages::Column::StartDate.lte(date))
            .filter(outages::Column::EndDate.gte(date))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|o| (o.user_id, o))
            .collect())
    }

    /// Per-user count of submissions that are still drawable: total
    /// submissions minus those picked within the no-repeat window.
    async fn eligible_counts(&self, window_start: NaiveDate) -> AppResult<HashMap<i64, i64>> {
        let album_list = albums::Entity::find().all(&self.pool).await?;
        let submitter_of: HashMap<i64, i64> = album_list
            .iter()
            .filter_map(|a| a.submitted_by.map(|s| (a.id, s)))
            .collect();

        let mut counts: HashMap<i64, i64> = HashMap::new();
        for album in &album_list {
            if let Some(submitter) = album.submitted_by {
                *counts.entry(submitter).or_insert(0) += 1;
            }
        }

        let recently_picked = daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.gte(window_start))
            .all(&self.pool)
            .await?;
        let mut seen: HashSet<i64> = HashSet::new();
        for pick in recently_picked {
            // An album picked twice in the window still only burns one slot
            if seen.insert(pick.album_id)
                && let Some(submitter) = submitter_of.get(&pick.album_id)
            {
                *counts.entry(*submitter).or_insert(0) -= 1;
            }
        }
        Ok(counts)
    }

    async fn days_since_last_review(&self, user_id: i64, day: NaiveDate) -> AppResult<i64> {
        let last = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .order_by_desc(reviews::Column::AotdDate)
            .one(&self.pool)
            .await?;
        Ok(last.map(|r| (day - r.aotd_date).num_days()).unwrap_or(0))
    }

    async fn upsert_cache(
        &self,
        user_id: i64,
        percentage: f64,
        block_type: Option<BlockType>,
        outage_id: Option<i64>,
        reason: Option<String>,
    ) -> AppResult<()> {
        let existing = chances::Entity::find()
            .filter(chances::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;

        match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.chance_percentage = Set(percentage);
                am.block_type = Set(block_type);
                am.outage_id = Set(outage_id);
                am.reason = Set(reason);
                am.updated_at = Set(Some(Utc::now()));
                am.update(&self.pool).await?;
            }
            None => {
                chances::ActiveModel {
                    user_id: Set(user_id),
                    chance_percentage: Set(percentage),
                    block_type: Set(block_type),
                    outage_id: Set(outage_id),
                    reason: Set(reason),
                    updated_at: Set(Some(Utc::now())),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}
