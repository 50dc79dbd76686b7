//! Shared fixtures for service tests: an in-memory SQLite database migrated
//! with the real workspace migrations, plus seed helpers with controllable
//! timestamps.

use crate::entities::{
    RATING_PENDING, album_entity as albums, aotd_user_entity as aotd_users,
    daily_album_entity as daily_albums, review_entity as reviews,
    review_history_entity as history, user_entity as users,
};
use chrono::{DateTime, NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, IntoActiveModel, Set,
};

pub async fn test_db() -> DatabaseConnection {
    // A single connection keeps every query on the same in-memory database
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1).sqlx_logging(false);
    let conn = Database::connect(opts).await.expect("in-memory sqlite");
    Migrator::up(&conn, None).await.expect("schema migration");
    conn
}

pub async fn seed_user(pool: &DatabaseConnection, discord_id: &str, nickname: &str) -> users::Model {
    let user = users::ActiveModel {
        discord_id: Set(discord_id.to_string()),
        nickname: Set(nickname.to_string()),
        aotd_enrolled: Set(true),
        created_at: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert user");

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
    .insert(pool)
    .await
    .expect("insert aotd user data");

    user
}

pub async fn seed_album(
    pool: &DatabaseConnection,
    catalog_id: &str,
    title: &str,
    submitted_by: Option<i64>,
) -> albums::Model {
    albums::ActiveModel {
        catalog_id: Set(catalog_id.to_string()),
        title: Set(title.to_string()),
        artist: Set("Test Artist".to_string()),
        submitted_by: Set(submitted_by),
        submission_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert album")
}

pub async fn seed_pick(
    pool: &DatabaseConnection,
    album_id: i64,
    date: NaiveDate,
) -> daily_albums::Model {
    daily_albums::ActiveModel {
        album_id: Set(album_id),
        date: Set(date),
        manual: Set(false),
        rating: Set(Some(RATING_PENDING)),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert daily pick")
}

pub async fn seed_review(
    pool: &DatabaseConnection,
    album_id: i64,
    user_id: i64,
    aotd_date: NaiveDate,
    score: f64,
    at: DateTime<Utc>,
) -> reviews::Model {
    reviews::ActiveModel {
        album_id: Set(album_id),
        user_id: Set(user_id),
        aotd_date: Set(aotd_date),
        score: Set(score),
        first_listen: Set(false),
        review_date: Set(at),
        last_updated: Set(at),
        version: Set(1),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert review")
}

/// Edit a review the way the service layer does (snapshot, then update), but
/// with a caller-controlled edit timestamp.
pub async fn apply_edit(
    pool: &DatabaseConnection,
    review: &reviews::Model,
    new_score: f64,
    at: DateTime<Utc>,
) -> reviews::Model {
    history::ActiveModel {
        review_id: Set(review.id),
        aotd_date: Set(review.aotd_date),
        score: Set(review.score),
        review_text: Set(review.review_text.clone()),
        first_listen: Set(review.first_listen),
        last_updated: Set(review.last_updated),
        recorded_at: Set(at),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert history snapshot");

    let mut am = review.clone().into_active_model();
    am.score = Set(new_score);
    am.last_updated = Set(at);
    am.version = Set(review.version + 1);
    am.update(pool).await.expect("update review")
}
