use crate::config::AotdConfig;
use crate::entities::{
    RATING_PENDING, album_entity as albums, daily_album_entity as daily_albums,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AlbumResponse, DailyPickResponse, MonthPick, MonthStats, MonthViewResponse,
    SubmitterSelectionCount,
};
use crate::services::{ChanceService, RatingService, TimelineService};
use crate::utils::{round2, today};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct SelectionService {
    pool: DatabaseConnection,
    config: AotdConfig,
    chance_service: ChanceService,
    timeline_service: TimelineService,
    rating_service: RatingService,
}

impl SelectionService {
    pub fn new(
        pool: DatabaseConnection,
        config: AotdConfig,
        chance_service: ChanceService,
        timeline_service: TimelineService,
        rating_service: RatingService,
    ) -> Self {
        Self {
            pool,
            config,
            chance_service,
            timeline_service,
            rating_service,
        }
    }

    /// Select today's album of the day.
    ///
    /// 1. Fail `AlreadySelected` if today already has a pick
    /// 2. Refresh every participant's eligibility flag
    /// 3. Pool = all submissions minus those from blocked or outaged users
    /// 4. Draw uniformly; a draw picked within the no-repeat window is
    ///    removed from the working pool and the draw retried
    /// 5. Fail `NoEligibleAlbums` when the pool runs dry
    /// 6. Persist the pick (the unique date index closes the races between
    ///    1 and here), then finalize yesterday's pick as a best-effort step
    pub async fn select_daily_pick(&self) -> AppResult<daily_albums::Model> {
        let day = today();

        if let Some(existing) = self.pick_on(day).await? {
            return Err(AppError::AlreadySelected(format!(
                "Album of the day for {day} is already album {}",
                existing.album_id
            )));
        }

        self.chance_service.refresh_all_blocked_flags().await?;
        let blocked = self.chance_service.blocked_user_ids(day).await?;
        log::info!("Users blocked from today's selection: {blocked:?}");

        let mut pool: Vec<albums::Model> = albums::Entity::find()
            .all(&self.pool)
            .await?
            .into_iter()
            .filter(|album| {
                album
                    .submitted_by
                    .map(|submitter| !blocked.contains(&submitter))
                    .unwrap_or(true)
            })
            .collect();

        let recently_picked = self.recently_picked_album_ids(day).await?;
        let selected = loop {
            if pool.is_empty() {
                return Err(AppError::NoEligibleAlbums);
            }
            let index = {
                let mut rng = rand::thread_rng();
                rng.gen_range(0..pool.len())
            };
            let candidate = pool.swap_remove(index);
            if recently_picked.contains(&candidate.id) {
                log::info!(
                    "Rejecting \"{}\": picked within the last {} days",
                    candidate.title,
                    self.config.no_repeat_window_days
                );
                continue;
            }
            break candidate;
        };

        let pick = self.insert_pick(selected.id, day, false, None).await?;
        log::info!(
            "Successfully selected album of the day for {day}: \"{}\" by {}",
            selected.title,
            selected.artist
        );

        // Yesterday's pick is now complete; freeze its rating and timeline.
        // A failure here must not undo today's selection.
        if let Err(e) = self.finalize_previous_day(day).await {
            log::error!("Error finalizing previous album of the day: {e:?}");
        }

        Ok(pick)
    }

    /// Admin override: set the pick for an arbitrary date, replacing any
    /// existing pick for that date. Skips every eligibility and no-repeat
    /// check on purpose.
    pub async fn select_daily_pick_admin(
        &self,
        date: NaiveDate,
        catalog_id: &str,
        admin_message: Option<String>,
    ) -> AppResult<daily_albums::Model> {
        let album = self.album_by_catalog_id(catalog_id).await?;

        let pick = match self.pick_on(date).await? {
            Some(existing) => {
                let mut am = existing.into_active_model();
                am.album_id = Set(album.id);
                am.manual = Set(true);
                am.admin_message = Set(admin_message);
                am.rating = Set(Some(RATING_PENDING));
                am.standard_deviation = Set(None);
                am.timeline = Set(None);
                am.update(&self.pool).await?
            }
            None => {
                daily_albums::ActiveModel {
                    album_id: Set(album.id),
                    date: Set(date),
                    manual: Set(true),
                    admin_message: Set(admin_message),
                    rating: Set(Some(RATING_PENDING)),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };

        log::info!(
            "Admin set album of the day for {date}: \"{}\" by {}",
            album.title,
            album.artist
        );
        Ok(pick)
    }

    pub async fn pick_for_date(&self, date: NaiveDate) -> AppResult<DailyPickResponse> {
        let pick = self
            .pick_on(date)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No album of the day for {date}")))?;
        let album = albums::Entity::find_by_id(pick.album_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Album of the day for {date} references missing album {}",
                    pick.album_id
                ))
            })?;

        let rating = if pick.is_finalized() { pick.rating } else { None };
        Ok(DailyPickResponse {
            date: pick.date,
            manual: pick.manual,
            admin_message: pick.admin_message,
            rating,
            standard_deviation: pick.standard_deviation,
            album: AlbumResponse::from(album),
        })
    }

    /// Month view: all picks up to today with their ratings, plus the
    /// highest/lowest rated picks and per-submitter selection counts.
    pub async fn picks_for_month(&self, year: i32, month: u32) -> AppResult<MonthViewResponse> {
        let picks: Vec<daily_albums::Model> = daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.lte(today()))
            .order_by_asc(daily_albums::Column::Date)
            .all(&self.pool)
            .await?
            .into_iter()
            .filter(|p| p.date.year() == year && p.date.month() == month)
            .collect();

        if picks.is_empty() {
            return Ok(MonthViewResponse {
                picks: Vec::new(),
                stats: None,
                timestamp: Utc::now(),
            });
        }

        let album_map: HashMap<i64, albums::Model> = albums::Entity::find()
            .filter(albums::Column::Id.is_in(picks.iter().map(|p| p.album_id).collect::<Vec<_>>()))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut month_picks = Vec::new();
        let mut highest: Option<(NaiveDate, f64)> = None;
        let mut lowest: Option<(NaiveDate, f64)> = None;
        let mut selections_by_submitter: HashMap<String, Vec<NaiveDate>> = HashMap::new();

        for pick in &picks {
            let album = album_map.get(&pick.album_id).ok_or_else(|| {
                AppError::InternalError(format!("Pick {} references missing album", pick.id))
            })?;
            let rating = self
                .rating_service
                .get_rating(&album.catalog_id, Some(pick.date), false)
                .await?;

            if let Some(r) = rating {
                if highest.is_none_or(|(_, best)| r > best) {
                    highest = Some((pick.date, r));
                }
                if lowest.is_none_or(|(_, worst)| r < worst) {
                    lowest = Some((pick.date, r));
                }
            }

            if let Some(submitter) = album.submitted_by {
                let discord_id = self.discord_id_of(submitter).await?;
                selections_by_submitter
                    .entry(discord_id)
                    .or_default()
                    .push(pick.date);
            }

            month_picks.push(MonthPick {
                date: pick.date,
                rating,
                album: AlbumResponse::from(album.clone()),
            });
        }

        let total = month_picks.len() as u32;
        let selection_counts = selections_by_submitter
            .into_iter()
            .map(|(discord_id, dates)| SubmitterSelectionCount {
                discord_id,
                count: dates.len() as u32,
                percent: round2(dates.len() as f64 / total as f64 * 100.0),
                selection_dates: dates,
            })
            .collect();

        Ok(MonthViewResponse {
            picks: month_picks,
            stats: Some(MonthStats {
                highest_aotd_date: highest.map(|(d, _)| d),
                lowest_aotd_date: lowest.map(|(d, _)| d),
                selection_total: total,
                selection_counts,
            }),
            timestamp: Utc::now(),
        })
    }

    /// Dates on which an album has been the pick, oldest first.
    pub async fn aotd_dates(&self, catalog_id: &str) -> AppResult<Vec<NaiveDate>> {
        let album = self.album_by_catalog_id(catalog_id).await?;
        Ok(daily_albums::Entity::find()
            .filter(daily_albums::Column::AlbumId.eq(album.id))
            .filter(daily_albums::Column::Date.lte(today()))
            .order_by_asc(daily_albums::Column::Date)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| p.date)
            .collect())
    }

    async fn finalize_previous_day(&self, day: NaiveDate) -> AppResult<()> {
        let yesterday = day - Duration::days(1);
        let Some(pick) = self.pick_on(yesterday).await? else {
            return Ok(());
        };
        if pick.is_finalized() {
            return Ok(());
        }
        self.timeline_service.finalize_pick(&pick).await?;
        Ok(())
    }

    async fn insert_pick(
        &self,
        album_id: i64,
        date: NaiveDate,
        manual: bool,
        admin_message: Option<String>,
    ) -> AppResult<daily_albums::Model> {
        let result = daily_albums::ActiveModel {
            album_id: Set(album_id),
            date: Set(date),
            manual: Set(manual),
            admin_message: Set(admin_message),
            rating: Set(Some(RATING_PENDING)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match result {
            Ok(pick) => Ok(pick),
            // A concurrent run got there first; surface it as the same typed
            // failure the precondition check produces
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                AppError::AlreadySelected(format!("Album of the day for {date} already exists")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn recently_picked_album_ids(&self, day: NaiveDate) -> AppResult<HashSet<i64>> {
        let window_start = day - Duration::days(self.config.no_repeat_window_days);
        Ok(daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.gte(window_start))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| p.album_id)
            .collect())
    }

    async fn pick_on(&self, date: NaiveDate) -> AppResult<Option<daily_albums::Model>> {
        Ok(daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.eq(date))
            .one(&self.pool)
            .await?)
    }

    async fn album_by_catalog_id(&self, catalog_id: &str) -> AppResult<albums::Model> {
        albums::Entity::find()
            .filter(albums::Column::CatalogId.eq(catalog_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {catalog_id} not found")))
    }

    async fn discord_id_of(&self, user_id: i64) -> AppResult<String> {
        use crate::entities::user_entity as users;
        Ok(users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .map(|u| u.discord_id)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_util::{
        seed_album, seed_pick, seed_review, seed_user, test_db,
    };

    fn service(pool: &DatabaseConnection) -> SelectionService {
        let config = AotdConfig::default();
        let rating = RatingService::new(pool.clone(), config.clone());
        SelectionService::new(
            pool.clone(),
            config.clone(),
            ChanceService::new(pool.clone(), config.clone()),
            TimelineService::new(pool.clone(), rating.clone()),
            rating,
        )
    }

    /// Recent review so the submitter passes the inactivity check.
    async fn keep_active(pool: &DatabaseConnection, user_id: i64, album_id: i64) {
        let day = today();
        seed_review(pool, album_id, user_id, day - Duration::days(1), 7.0, Utc::now()).await;
    }

    #[tokio::test]
    async fn test_sole_candidate_is_picked_and_second_call_fails() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "Only Album", Some(user.id)).await;
        keep_active(&pool, user.id, album.id).await;

        let service = service(&pool);
        let pick = service.select_daily_pick().await.unwrap();
        assert_eq!(pick.album_id, album.id);
        assert_eq!(pick.date, today());
        assert!(!pick.manual);

        let err = service.select_daily_pick().await.unwrap_err();
        assert!(matches!(err, AppError::AlreadySelected(_)));

        // Still exactly one pick for today
        let count = daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.eq(today()))
            .all(&pool)
            .await
            .unwrap()
            .len();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_no_eligible_albums_when_all_submitters_blocked() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        // No reviews at all: the submitter is inactivity-blocked
        seed_album(&pool, "alb-1", "Blocked Album", Some(user.id)).await;

        let service = service(&pool);
        let err = service.select_daily_pick().await.unwrap_err();
        assert!(matches!(err, AppError::NoEligibleAlbums));

        // And no pick was created
        let picks = daily_albums::Entity::find().all(&pool).await.unwrap();
        assert!(picks.is_empty());
    }

    #[tokio::test]
    async fn test_no_repeat_window_excludes_recent_picks() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "Repeat", Some(user.id)).await;
        keep_active(&pool, user.id, album.id).await;
        // Already picked two days ago, well inside the 365-day window
        seed_pick(&pool, album.id, today() - Duration::days(2)).await;

        let service = service(&pool);
        let err = service.select_daily_pick().await.unwrap_err();
        assert!(matches!(err, AppError::NoEligibleAlbums));
    }

    #[tokio::test]
    async fn test_album_outside_no_repeat_window_is_eligible_again() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "Old Pick", Some(user.id)).await;
        keep_active(&pool, user.id, album.id).await;
        seed_pick(&pool, album.id, today() - Duration::days(400)).await;

        let service = service(&pool);
        let pick = service.select_daily_pick().await.unwrap();
        assert_eq!(pick.album_id, album.id);
    }

    #[tokio::test]
    async fn test_outaged_submitter_is_excluded() {
        let pool = test_db().await;
        let u1 = seed_user(&pool, "100", "away").await;
        let u2 = seed_user(&pool, "101", "here").await;
        let blocked_album = seed_album(&pool, "alb-1", "Away Album", Some(u1.id)).await;
        let open_album = seed_album(&pool, "alb-2", "Here Album", Some(u2.id)).await;
        keep_active(&pool, u1.id, blocked_album.id).await;
        keep_active(&pool, u2.id, blocked_album.id).await;

        let day = today();
        crate::entities::outage_entity::ActiveModel {
            user_id: Set(u1.id),
            start_date: Set(day - Duration::days(1)),
            end_date: Set(day + Duration::days(1)),
            reason: Set("vacation".to_string()),
            admin_enacted: Set(false),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();

        let service = service(&pool);
        let pick = service.select_daily_pick().await.unwrap();
        assert_eq!(pick.album_id, open_album.id);
    }

    #[tokio::test]
    async fn test_selection_finalizes_yesterdays_pick() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let yesterday_album = seed_album(&pool, "alb-1", "Yesterday", Some(user.id)).await;
        seed_album(&pool, "alb-2", "Next", Some(user.id)).await;

        let yesterday = today() - Duration::days(1);
        let prev_pick = seed_pick(&pool, yesterday_album.id, yesterday).await;
        // Yesterday's review also keeps the submitter active today
        seed_review(
            &pool,
            yesterday_album.id,
            user.id,
            yesterday,
            7.0,
            Utc::now() - Duration::days(1),
        )
        .await;

        let service = service(&pool);
        service.select_daily_pick().await.unwrap();

        let finalized = daily_albums::Entity::find_by_id(prev_pick.id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert!(finalized.is_finalized());
        assert_eq!(finalized.rating, Some(7.0));
        assert!(finalized.timeline.is_some());
    }

    #[tokio::test]
    async fn test_admin_override_replaces_existing_pick() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let original = seed_album(&pool, "alb-1", "Original", Some(user.id)).await;
        let replacement = seed_album(&pool, "alb-2", "Replacement", Some(user.id)).await;
        let date = today() - Duration::days(10);
        seed_pick(&pool, original.id, date).await;

        let service = service(&pool);
        let pick = service
            .select_daily_pick_admin(date, "alb-2", Some("special day".to_string()))
            .await
            .unwrap();

        assert_eq!(pick.album_id, replacement.id);
        assert!(pick.manual);
        assert_eq!(pick.admin_message.as_deref(), Some("special day"));

        let all = daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.eq(date))
            .all(&pool)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_override_skips_no_repeat_check() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "Repeat", Some(user.id)).await;
        seed_pick(&pool, album.id, today() - Duration::days(2)).await;

        let service = service(&pool);
        // Same album again two days later, by admin fiat
        let pick = service
            .select_daily_pick_admin(today(), "alb-1", None)
            .await
            .unwrap();
        assert_eq!(pick.album_id, album.id);
        assert!(pick.manual);
    }

    #[tokio::test]
    async fn test_aotd_dates_lists_past_picks() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let d1 = today() - Duration::days(400);
        let d2 = today() - Duration::days(20);
        seed_pick(&pool, album.id, d1).await;
        seed_pick(&pool, album.id, d2).await;

        let service = service(&pool);
        assert_eq!(service.aotd_dates("alb-1").await.unwrap(), vec![d1, d2]);
    }

    #[tokio::test]
    async fn test_month_view_stats() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let a1 = seed_album(&pool, "alb-1", "Low", Some(user.id)).await;
        let a2 = seed_album(&pool, "alb-2", "High", Some(user.id)).await;
        let day = today();
        let d1 = day - Duration::days(1);
        seed_pick(&pool, a1.id, d1).await;
        seed_pick(&pool, a2.id, day).await;
        seed_review(&pool, a1.id, user.id, d1, 4.0, Utc::now() - Duration::days(1)).await;
        seed_review(&pool, a2.id, user.id, day, 9.0, Utc::now()).await;

        let service = service(&pool);
        let view = service
            .picks_for_month(day.year(), day.month())
            .await
            .unwrap();

        // Both picks land in the current month unless it rolled over at
        // midnight between the seeds; tolerate the boundary case
        if view.picks.len() == 2 {
            let stats = view.stats.unwrap();
            assert_eq!(stats.selection_total, 2);
            assert_eq!(stats.highest_aotd_date, Some(day));
            assert_eq!(stats.lowest_aotd_date, Some(d1));
            assert_eq!(stats.selection_counts.len(), 1);
            assert_eq!(stats.selection_counts[0].count, 2);
            assert_eq!(stats.selection_counts[0].percent, 100.0);
        }
    }
}
