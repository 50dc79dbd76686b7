use crate::config::AotdConfig;
use crate::entities::{
    album_entity as albums, aotd_user_entity as aotd_users, daily_album_entity as daily_albums,
    review_entity as reviews, review_history_entity as history, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ReviewHistoryResponse, ReviewResponse, ReviewVersionResponse, SubmitReviewRequest,
    UserStreakData,
};
use crate::services::{ChanceService, StreakService};
use crate::utils::{is_on_grid, today};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct ReviewService {
    pool: DatabaseConnection,
    config: AotdConfig,
    streak_service: StreakService,
    chance_service: ChanceService,
}

impl ReviewService {
    pub fn new(
        pool: DatabaseConnection,
        config: AotdConfig,
        streak_service: StreakService,
        chance_service: ChanceService,
    ) -> Self {
        Self {
            pool,
            config,
            streak_service,
            chance_service,
        }
    }

    /// Submit (or re-submit) today's review.
    ///
    /// The album must be today's pick. A first submission creates the review
    /// and rolls the user's streak, eligibility flag and review stats; a
    /// repeat submission becomes an edit via [`Self::record_edit`].
    pub async fn submit_review(&self, req: &SubmitReviewRequest) -> AppResult<reviews::Model> {
        self.validate_score(req.score)?;

        let user = self.user_by_discord_id(&req.discord_id).await?;
        let album = albums::Entity::find()
            .filter(albums::Column::CatalogId.eq(&req.album_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {} not found", req.album_id)))?;

        let day = today();
        let pick = daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.eq(day))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No album of the day for {day}")))?;
        if pick.album_id != album.id {
            return Err(AppError::ValidationError(format!(
                "Album {} is not the album of the day for {day}",
                req.album_id
            )));
        }

        let existing = reviews::Entity::find()
            .filter(reviews::Column::AlbumId.eq(album.id))
            .filter(reviews::Column::UserId.eq(user.id))
            .filter(reviews::Column::AotdDate.eq(day))
            .one(&self.pool)
            .await?;

        let review = match existing {
            Some(current) => {
                let (updated, _) = self
                    .record_edit(
                        current,
                        req.score,
                        req.comment.clone(),
                        req.first_listen,
                    )
                    .await?;
                updated
            }
            None => {
                let now = Utc::now();
                let review = reviews::ActiveModel {
                    album_id: Set(album.id),
                    user_id: Set(user.id),
                    aotd_date: Set(day),
                    score: Set(req.score),
                    review_text: Set(req.comment.clone()),
                    first_listen: Set(req.first_listen),
                    review_date: Set(now),
                    last_updated: Set(now),
                    version: Set(1),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;

                self.streak_service.record_review(user.id, day).await?;
                review
            }
        };

        // Creating or editing a review can flip the eligibility flag and
        // shifts the user's cached stats
        if let Some(profile) = aotd_users::Entity::find_by_id(user.id).one(&self.pool).await? {
            self.chance_service.refresh_blocked_flag(&profile).await?;
        }
        self.recompute_user_stats(user.id).await?;

        Ok(review)
    }

    /// Apply an edit as the explicit two-step the data model demands: inside
    /// one transaction, snapshot the pre-edit state into the history table,
    /// then update the review in place (version + 1). Returns both rows.
    pub async fn record_edit(
        &self,
        review: reviews::Model,
        score: f64,
        review_text: Option<String>,
        first_listen: bool,
    ) -> AppResult<(reviews::Model, history::Model)> {
        self.validate_score(score)?;

        let txn = self.pool.begin().await?;
        let now = Utc::now();

        let snapshot = history::ActiveModel {
            review_id: Set(review.id),
            aotd_date: Set(review.aotd_date),
            score: Set(review.score),
            review_text: Set(review.review_text.clone()),
            first_listen: Set(review.first_listen),
            last_updated: Set(review.last_updated),
            recorded_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let version = review.version;
        let mut am = review.into_active_model();
        am.score = Set(score);
        am.review_text = Set(review_text);
        am.first_listen = Set(first_listen);
        am.last_updated = Set(now);
        am.version = Set(version + 1);
        let updated = am.update(&txn).await?;

        txn.commit().await?;
        Ok((updated, snapshot))
    }

    /// All reviews for an album on a pick day (default: its most recent),
    /// each carrying the reviewer's streak data.
    pub async fn reviews_for_album(
        &self,
        catalog_id: &str,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<ReviewResponse>> {
        let album = albums::Entity::find()
            .filter(albums::Column::CatalogId.eq(catalog_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {catalog_id} not found")))?;

        let date = match date {
            Some(d) => d,
            None => {
                daily_albums::Entity::find()
                    .filter(daily_albums::Column::AlbumId.eq(album.id))
                    .order_by_desc(daily_albums::Column::Date)
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Album {catalog_id} has never been album of the day"
                        ))
                    })?
                    .date
            }
        };

        let review_list = reviews::Entity::find()
            .filter(reviews::Column::AlbumId.eq(album.id))
            .filter(reviews::Column::AotdDate.eq(date))
            .order_by_asc(reviews::Column::ReviewDate)
            .all(&self.pool)
            .await?;

        let profile_map: HashMap<i64, aotd_users::Model> = aotd_users::Entity::find()
            .filter(
                aotd_users::Column::UserId
                    .is_in(review_list.iter().map(|r| r.user_id).collect::<Vec<_>>()),
            )
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let day = today();
        Ok(review_list
            .into_iter()
            .map(|r| {
                let streak = profile_map
                    .get(&r.user_id)
                    .map(|p| UserStreakData::from_profile(p, day));
                let mut response = ReviewResponse::from(r);
                response.user_streak_data = streak;
                response
            })
            .collect())
    }

    pub async fn user_review_for_album(
        &self,
        discord_id: &str,
        catalog_id: &str,
        date: Option<NaiveDate>,
    ) -> AppResult<Option<ReviewResponse>> {
        let user = self.user_by_discord_id(discord_id).await?;
        let album = albums::Entity::find()
            .filter(albums::Column::CatalogId.eq(catalog_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {catalog_id} not found")))?;
        let date = date.unwrap_or_else(today);

        Ok(reviews::Entity::find()
            .filter(reviews::Column::AlbumId.eq(album.id))
            .filter(reviews::Column::UserId.eq(user.id))
            .filter(reviews::Column::AotdDate.eq(date))
            .one(&self.pool)
            .await?
            .map(ReviewResponse::from))
    }

    /// A review plus its edit trail, newest first, with the current version
    /// prepended.
    pub async fn review_with_history(&self, review_id: i64) -> AppResult<ReviewHistoryResponse> {
        let review = reviews::Entity::find_by_id(review_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {review_id} not found")))?;

        let mut historical: Vec<ReviewVersionResponse> = vec![ReviewVersionResponse {
            score: review.score,
            review_text: review.review_text.clone(),
            first_listen: review.first_listen,
            last_updated: review.last_updated,
            recorded_at: review.last_updated,
        }];
        historical.extend(
            history::Entity::find()
                .filter(history::Column::ReviewId.eq(review_id))
                .order_by_desc(history::Column::RecordedAt)
                .all(&self.pool)
                .await?
                .into_iter()
                .map(ReviewVersionResponse::from),
        );

        Ok(ReviewHistoryResponse {
            review: ReviewResponse::from(review),
            historical,
        })
    }

    fn validate_score(&self, score: f64) -> AppResult<()> {
        if !(0.0..=10.0).contains(&score) {
            return Err(AppError::ValidationError(format!(
                "Score {score} is outside 0-10"
            )));
        }
        if !is_on_grid(score, self.config.score_granularity) {
            return Err(AppError::ValidationError(format!(
                "Score {score} is not a multiple of {}",
                self.config.score_granularity
            )));
        }
        Ok(())
    }

    async fn recompute_user_stats(&self, user_id: i64) -> AppResult<()> {
        let review_list = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .all(&self.pool)
            .await?;
        let total = review_list.len() as i32;
        let average = if review_list.is_empty() {
            None
        } else {
            Some(review_list.iter().map(|r| r.score).sum::<f64>() / review_list.len() as f64)
        };

        if let Some(profile) = aotd_users::Entity::find_by_id(user_id).one(&self.pool).await? {
            let mut am = profile.into_active_model();
            am.total_reviews = Set(total);
            am.review_score_average = Set(average);
            am.update(&self.pool).await?;
        }
        Ok(())
    }

    async fn user_by_discord_id(&self, discord_id: &str) -> AppResult<users::Model> {
        users::Entity::find()
            .filter(users::Column::DiscordId.eq(discord_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {discord_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_util::{seed_album, seed_pick, seed_user, test_db};

    fn service(pool: &DatabaseConnection) -> ReviewService {
        let config = AotdConfig::default();
        ReviewService::new(
            pool.clone(),
            config.clone(),
            StreakService::new(pool.clone()),
            ChanceService::new(pool.clone(), config),
        )
    }

    fn request(discord_id: &str, album_id: &str, score: f64) -> SubmitReviewRequest {
        SubmitReviewRequest {
            discord_id: discord_id.to_string(),
            album_id: album_id.to_string(),
            score,
            comment: Some("solid record".to_string()),
            first_listen: true,
        }
    }

    #[tokio::test]
    async fn test_submit_creates_review_and_rolls_streak() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        let review = service.submit_review(&request("100", "alb-1", 7.5)).await.unwrap();
        assert_eq!(review.score, 7.5);
        assert_eq!(review.version, 1);
        assert!(!review.is_edited());

        let profile = aotd_users::Entity::find_by_id(user.id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.last_review_date, Some(today()));
        assert_eq!(profile.total_reviews, 1);
        assert_eq!(profile.review_score_average, Some(7.5));
        // A fresh review clears the inactivity flag
        assert!(!profile.selection_blocked_flag);
    }

    #[tokio::test]
    async fn test_resubmit_becomes_an_edit_with_history() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        service.submit_review(&request("100", "alb-1", 8.0)).await.unwrap();
        let review = service.submit_review(&request("100", "alb-1", 6.0)).await.unwrap();

        assert_eq!(review.score, 6.0);
        assert_eq!(review.version, 2);
        assert!(review.is_edited());

        // Exactly one review row, one snapshot row
        let rows = reviews::Entity::find().all(&pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        let snapshots = history::Entity::find().all(&pool).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].score, 8.0);
        assert_eq!(snapshots[0].review_id, review.id);
        // The snapshot chains back to the state it superseded
        assert_eq!(snapshots[0].last_updated, rows[0].review_date);

        // Streak counted once, not twice
        let profile = aotd_users::Entity::find_by_id(user.id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.current_streak, 1);
    }

    #[tokio::test]
    async fn test_submit_fails_without_a_pick() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        seed_album(&pool, "alb-1", "First", Some(user.id)).await;

        let service = service(&pool);
        let err = service
            .submit_review(&request("100", "alb-1", 7.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_fails_for_wrong_album() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let picked = seed_album(&pool, "alb-1", "Picked", Some(user.id)).await;
        seed_album(&pool, "alb-2", "Other", Some(user.id)).await;
        seed_pick(&pool, picked.id, today()).await;

        let service = service(&pool);
        let err = service
            .submit_review(&request("100", "alb-2", 7.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_score_validation() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        for bad in [-1.0, 10.5, 7.3] {
            let err = service
                .submit_review(&request("100", "alb-1", bad))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)), "score {bad}");
        }
        // Half points are the grid
        service.submit_review(&request("100", "alb-1", 0.0)).await.unwrap();
        service.submit_review(&request("100", "alb-1", 10.0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_review_with_history_lists_versions_newest_first() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        service.submit_review(&request("100", "alb-1", 8.0)).await.unwrap();
        service.submit_review(&request("100", "alb-1", 6.0)).await.unwrap();
        let current = service.submit_review(&request("100", "alb-1", 9.0)).await.unwrap();

        let trail = service.review_with_history(current.id).await.unwrap();
        assert_eq!(trail.review.version, 3);
        assert_eq!(trail.historical.len(), 3);
        // Current version first, then snapshots newest-first
        assert_eq!(trail.historical[0].score, 9.0);
        assert_eq!(trail.historical[1].score, 6.0);
        assert_eq!(trail.historical[2].score, 8.0);
    }

    #[tokio::test]
    async fn test_reviews_for_album_carry_streak_data() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        service.submit_review(&request("100", "alb-1", 7.0)).await.unwrap();

        let list = service.reviews_for_album("alb-1", None).await.unwrap();
        assert_eq!(list.len(), 1);
        let streak = list[0].user_streak_data.as_ref().unwrap();
        assert_eq!(streak.current_streak, 1);
        assert!(!streak.streak_at_risk);
    }

    #[tokio::test]
    async fn test_user_review_lookup() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        assert!(service
            .user_review_for_album("100", "alb-1", None)
            .await
            .unwrap()
            .is_none());

        service.submit_review(&request("100", "alb-1", 7.0)).await.unwrap();
        let found = service
            .user_review_for_album("100", "alb-1", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.score, 7.0);
    }

    #[tokio::test]
    async fn test_edit_preserves_invariant_on_timestamps() {
        let pool = test_db().await;
        let user = seed_user(&pool, "100", "u1").await;
        let album = seed_album(&pool, "alb-1", "First", Some(user.id)).await;
        seed_pick(&pool, album.id, today()).await;

        let service = service(&pool);
        let created = service.submit_review(&request("100", "alb-1", 8.0)).await.unwrap();
        assert_eq!(created.review_date, created.last_updated);

        let (edited, snapshot) = service
            .record_edit(created.clone(), 6.5, None, false)
            .await
            .unwrap();
        assert!(edited.last_updated > edited.review_date);
        assert_eq!(snapshot.last_updated, created.last_updated);
        assert_eq!(snapshot.recorded_at, edited.last_updated);
    }
}
