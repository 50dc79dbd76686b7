use crate::entities::{aotd_user_entity as aotd_users, daily_album_entity as daily_albums};
use crate::error::{AppError, AppResult};
use crate::utils::today;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};

#[derive(Clone)]
pub struct StreakService {
    pool: DatabaseConnection,
}

impl StreakService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Update a user's streak for a newly created review (edits never come
    /// through here). A streak continues when the user's previous review was
    /// for the most recent pick day before this one, and restarts at 1
    /// otherwise.
    pub async fn record_review(&self, user_id: i64, pick_day: NaiveDate) -> AppResult<()> {
        let profile = self.profile(user_id).await?;

        // Already counted for this day; creation is unique per day so this
        // only fires on misuse
        if profile.last_review_date == Some(pick_day) {
            return Ok(());
        }

        let prior_pick_day = self.most_recent_pick_day_before(pick_day).await?;

        let current = if profile.last_review_date.is_some()
            && profile.last_review_date == prior_pick_day
        {
            profile.current_streak + 1
        } else {
            1
        };
        let longest = profile.longest_streak.max(current);

        let mut am = profile.into_active_model();
        am.current_streak = Set(current);
        am.longest_streak = Set(longest);
        am.last_review_date = Set(Some(pick_day));
        am.update(&self.pool).await?;

        log::debug!("Streak for user {user_id} is now {current} (longest {longest})");
        Ok(())
    }

    /// Zero the streak of every user who reviewed neither the most recent
    /// completed pick day nor today. Returns how many users were reset.
    pub async fn reset_stale_streaks(&self) -> AppResult<u64> {
        let day = today();
        let prior_pick_day = self.most_recent_pick_day_before(day).await?;

        let mut stale = Condition::any().add(aotd_users::Column::LastReviewDate.is_null());
        let mut keep_dates = vec![day];
        if let Some(prior) = prior_pick_day {
            keep_dates.push(prior);
        }
        stale = stale.add(aotd_users::Column::LastReviewDate.is_not_in(keep_dates));

        let res = aotd_users::Entity::update_many()
            .col_expr(aotd_users::Column::CurrentStreak, Expr::value(0))
            .filter(stale)
            .filter(aotd_users::Column::CurrentStreak.ne(0))
            .exec(&self.pool)
            .await?;

        if res.rows_affected > 0 {
            log::info!("Reset {} stale review streaks", res.rows_affected);
        }
        Ok(res.rows_affected)
    }

    /// A streak is at risk while the user has not yet reviewed today.
    pub fn is_streak_at_risk(&self, profile: &aotd_users::Model) -> bool {
        profile.last_review_date != Some(today())
    }

    pub async fn profile(&self, user_id: i64) -> AppResult<aotd_users::Model> {
        aotd_users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No AOtD profile for user {user_id}")))
    }

    async fn most_recent_pick_day_before(
        &self,
        day: NaiveDate,
    ) -> AppResult<Option<NaiveDate>> {
        Ok(daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.lt(day))
            .order_by_desc(daily_albums::Column::Date)
            .one(&self.pool)
            .await?
            .map(|pick| pick.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_util::{seed_album, seed_pick, seed_user, test_db};
    use chrono::{Duration, Utc};

    async fn profile_of(pool: &DatabaseConnection, user_id: i64) -> aotd_users::Model {
        aotd_users::Entity::find_by_id(user_id)
            .one(pool)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_review_starts_streak_at_one() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, album.id, day).await;

        let service = StreakService::new(pool.clone());
        service.record_review(user.id, day).await.unwrap();

        let profile = profile_of(&pool, user.id).await;
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.longest_streak, 1);
        assert_eq!(profile.last_review_date, Some(day));
    }

    #[tokio::test]
    async fn test_consecutive_pick_days_increment() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let a1 = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let a2 = seed_album(&pool, "alb-2", "Second", Some(user.id)).await;
        let a3 = seed_album(&pool, "alb-3", "Third", Some(user.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, a1.id, day - Duration::days(2)).await;
        seed_pick(&pool, a2.id, day - Duration::days(1)).await;
        seed_pick(&pool, a3.id, day).await;

        let service = StreakService::new(pool.clone());
        service
            .record_review(user.id, day - Duration::days(2))
            .await
            .unwrap();
        service
            .record_review(user.id, day - Duration::days(1))
            .await
            .unwrap();
        service.record_review(user.id, day).await.unwrap();

        let profile = profile_of(&pool, user.id).await;
        assert_eq!(profile.current_streak, 3);
        assert_eq!(profile.longest_streak, 3);
    }

    #[tokio::test]
    async fn test_missed_pick_day_restarts_streak() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let a1 = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let a2 = seed_album(&pool, "alb-2", "Second", Some(user.id)).await;
        let a3 = seed_album(&pool, "alb-3", "Third", Some(user.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, a1.id, day - Duration::days(2)).await;
        seed_pick(&pool, a2.id, day - Duration::days(1)).await;
        seed_pick(&pool, a3.id, day).await;

        let service = StreakService::new(pool.clone());
        service
            .record_review(user.id, day - Duration::days(2))
            .await
            .unwrap();
        // Skips the middle pick day
        service.record_review(user.id, day).await.unwrap();

        let profile = profile_of(&pool, user.id).await;
        assert_eq!(profile.current_streak, 1);
        // Longest streak survives the restart
        assert_eq!(profile.longest_streak, 1);
        assert!(profile.longest_streak >= profile.current_streak);
    }

    #[tokio::test]
    async fn test_gap_in_picks_does_not_break_streak() {
        // Streaks follow pick days, not calendar days: if no album was
        // picked for a stretch, reviewing the next pick continues the run
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let a1 = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let a2 = seed_album(&pool, "alb-2", "Second", Some(user.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, a1.id, day - Duration::days(5)).await;
        seed_pick(&pool, a2.id, day).await;

        let service = StreakService::new(pool.clone());
        service
            .record_review(user.id, day - Duration::days(5))
            .await
            .unwrap();
        service.record_review(user.id, day).await.unwrap();

        let profile = profile_of(&pool, user.id).await;
        assert_eq!(profile.current_streak, 2);
    }

    #[tokio::test]
    async fn test_same_day_is_a_noop() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, album.id, day).await;

        let service = StreakService::new(pool.clone());
        service.record_review(user.id, day).await.unwrap();
        service.record_review(user.id, day).await.unwrap();

        let profile = profile_of(&pool, user.id).await;
        assert_eq!(profile.current_streak, 1);
    }

    #[tokio::test]
    async fn test_longest_streak_never_below_current() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let day = Utc::now().date_naive();
        for offset in (0..4).rev() {
            let album = seed_album(
                &pool,
                &format!("alb-{offset}"),
                "Album",
                Some(user.id),
            )
            .await;
            seed_pick(&pool, album.id, day - Duration::days(offset)).await;
        }

        let service = StreakService::new(pool.clone());
        for offset in (0..4).rev() {
            service
                .record_review(user.id, day - Duration::days(offset))
                .await
                .unwrap();
            let profile = profile_of(&pool, user.id).await;
            assert!(profile.longest_streak >= profile.current_streak);
        }
    }

    #[tokio::test]
    async fn test_reset_stale_streaks() {
        let pool = test_db().await;
        let active = seed_user(&pool, "100", "active").await;
        let stale = seed_user(&pool, "101", "stale").await;
        let never = seed_user(&pool, "102", "never").await;
        let a1 = seed_album(&pool, "alb-1", "First", Some(active.id)).await;
        let a2 = seed_album(&pool, "alb-2", "Second", Some(active.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, a1.id, day - Duration::days(1)).await;
        seed_pick(&pool, a2.id, day).await;

        let service = StreakService::new(pool.clone());
        // active reviewed yesterday's pick; stale reviewed an older one
        service
            .record_review(active.id, day - Duration::days(1))
            .await
            .unwrap();
        service
            .record_review(stale.id, day - Duration::days(3))
            .await
            .unwrap();

        let reset = service.reset_stale_streaks().await.unwrap();
        assert_eq!(reset, 1);

        assert_eq!(profile_of(&pool, active.id).await.current_streak, 1);
        assert_eq!(profile_of(&pool, stale.id).await.current_streak, 0);
        // Users who never reviewed stay at zero without being counted
        assert_eq!(profile_of(&pool, never.id).await.current_streak, 0);
    }

    #[tokio::test]
    async fn test_streak_at_risk() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        let day = Utc::now().date_naive();
        seed_pick(&pool, album.id, day).await;

        let service = StreakService::new(pool.clone());
        let profile = profile_of(&pool, user.id).await;
        assert!(service.is_streak_at_risk(&profile));

        service.record_review(user.id, day).await.unwrap();
        let profile = profile_of(&pool, user.id).await;
        assert!(!service.is_streak_at_risk(&profile));
    }
}
