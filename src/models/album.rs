use crate::entities::album_entity as albums;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitAlbumRequest {
    #[schema(example = "9b9e5dd3-5b93-3a5b-aee0-72f04f88bb1b")]
    pub catalog_id: String,
    pub title: String,
    pub artist: String,
    pub artist_url: Option<String>,
    pub cover_url: Option<String>,
    pub album_url: Option<String>,
    #[schema(example = "189734016587464704")]
    pub submitter_discord_id: String,
    pub user_comment: Option<String>,
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AlbumResponse {
    pub catalog_id: String,
    pub title: String,
    pub artist: String,
    pub artist_url: Option<String>,
    pub cover_url: Option<String>,
    pub album_url: Option<String>,
    pub submitter_id: Option<i64>,
    pub user_comment: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub release_date: Option<NaiveDate>,
}

impl From<albums::Model> for AlbumResponse {
    fn from(m: albums::Model) -> Self {
        Self {
            catalog_id: m.catalog_id,
            title: m.title,
            artist: m.artist,
            artist_url: m.artist_url,
            cover_url: m.cover_url,
            album_url: m.album_url,
            submitter_id: m.submitted_by,
            user_comment: m.user_comment,
            submission_date: m.submission_date,
            release_date: m.release_date,
        }
    }
}
