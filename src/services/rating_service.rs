use crate::config::AotdConfig;
use crate::entities::{
    album_entity as albums, daily_album_entity as daily_albums, review_entity as reviews,
    review_history_entity as history,
};
use crate::error::{AppError, AppResult};
use crate::utils::round_to_granularity;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

#[derive(Clone)]
pub struct RatingService {
    pool: DatabaseConnection,
    config: AotdConfig,
}

impl RatingService {
    pub fn new(pool: DatabaseConnection, config: AotdConfig) -> Self {
        Self { pool, config }
    }

    /// Average rating of an album for a given AOtD day.
    ///
    /// A finalized pick returns its frozen value directly; an unfinalized one
    /// is computed fresh from the day's reviews. `None` means the day
    /// received no reviews. `date` defaults to the album's most recent pick
    /// day.
    pub async fn get_rating(
        &self,
        catalog_id: &str,
        date: Option<NaiveDate>,
        rounded: bool,
    ) -> AppResult<Option<f64>> {
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

        let pick = daily_albums::Entity::find()
            .filter(daily_albums::Column::Date.eq(date))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No album of the day for {date}")))?;

        let rating = if pick.is_finalized() {
            pick.rating
        } else {
            self.mean_for_day(pick.album_id, pick.date).await?
        };

        Ok(rating.map(|r| {
            if rounded {
                round_to_granularity(r, self.config.score_granularity)
            } else {
                r
            }
        }))
    }

    /// Unrounded mean of the day's current review scores; `None` when the day
    /// has no reviews.
    pub async fn mean_for_day(
        &self,
        album_id: i64,
        aotd_date: NaiveDate,
    ) -> AppResult<Option<f64>> {
        let review_list = self.reviews_for_day(album_id, aotd_date).await?;
        if review_list.is_empty() {
            return Ok(None);
        }
        let sum: f64 = review_list.iter().map(|r| r.score).sum();
        Ok(Some(sum / review_list.len() as f64))
    }

    /// Population standard deviation of the day's current scores.
    pub async fn score_std_dev(
        &self,
        album_id: i64,
        aotd_date: NaiveDate,
    ) -> AppResult<Option<f64>> {
        let review_list = self.reviews_for_day(album_id, aotd_date).await?;
        if review_list.is_empty() {
            return Ok(None);
        }
        let n = review_list.len() as f64;
        let mean: f64 = review_list.iter().map(|r| r.score).sum::<f64>() / n;
        let variance: f64 = review_list
            .iter()
            .map(|r| (r.score - mean).powi(2))
            .sum::<f64>()
            / n;
        Ok(Some(variance.sqrt()))
    }

    /// The album's average "as of" an instant within the day, reconstructing
    /// each edited review's score at that moment from its history trail.
    ///
    /// Every review on the (album, day) counts exactly once: a review whose
    /// current value already predates `as_of` (or was never edited) counts at
    /// its current score; one edited after `as_of` counts at its most recent
    /// snapshot at or before `as_of`, falling back to its earliest recorded
    /// state when it was created after `as_of`.
    ///
    /// Calling this with zero reviews on the day is a caller bug.
    pub async fn partial_average(
        &self,
        album_id: i64,
        aotd_date: NaiveDate,
        as_of: DateTime<Utc>,
    ) -> AppResult<f64> {
        let review_list = self.reviews_for_day(album_id, aotd_date).await?;
        if review_list.is_empty() {
            return Err(AppError::InternalError(format!(
                "Partial average requested for album {album_id} on {aotd_date} with no reviews"
            )));
        }

        let mut sum = 0.0;
        for review in &review_list {
            let score = if !review.is_edited() {
                review.score
            } else if review.last_updated > as_of {
                self.score_at(review, as_of).await?
            } else {
                // Edited, but the final value already predates the cutoff
                review.score
            };
            sum += score;
        }
        Ok(sum / review_list.len() as f64)
    }

    async fn reviews_for_day(
        &self,
        album_id: i64,
        aotd_date: NaiveDate,
    ) -> AppResult<Vec<reviews::Model>> {
        Ok(reviews::Entity::find()
            .filter(reviews::Column::AlbumId.eq(album_id))
            .filter(reviews::Column::AotdDate.eq(aotd_date))
            .all(&self.pool)
            .await?)
    }

    async fn score_at(&self, review: &reviews::Model, as_of: DateTime<Utc>) -> AppResult<f64> {
        let snapshot = history::Entity::find()
            .filter(history::Column::ReviewId.eq(review.id))
            .filter(history::Column::LastUpdated.lte(as_of))
            .order_by_desc(history::Column::LastUpdated)
            .one(&self.pool)
            .await?;
        if let Some(h) = snapshot {
            return Ok(h.score);
        }
        // The review only came into existence after the cutoff; use its
        // earliest recorded state.
        let earliest = history::Entity::find()
            .filter(history::Column::ReviewId.eq(review.id))
            .order_by_asc(history::Column::LastUpdated)
            .one(&self.pool)
            .await?;
        Ok(earliest.map(|h| h.score).unwrap_or(review.score))
    }
}
