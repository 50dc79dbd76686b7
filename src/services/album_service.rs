use crate::entities::{album_entity as albums, daily_album_entity as daily_albums};
use crate::error::{AppError, AppResult};
use crate::models::SubmitAlbumRequest;
use crate::services::UserService;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

#[derive(Clone)]
pub struct AlbumService {
    pool: DatabaseConnection,
    user_service: UserService,
}

impl AlbumService {
    pub fn new(pool: DatabaseConnection, user_service: UserService) -> Self {
        Self { pool, user_service }
    }

    /// Submit an album into the pool. Catalog ids are unique; a duplicate
    /// submission is a conflict, whoever submits it.
    pub async fn submit_album(&self, req: &SubmitAlbumRequest) -> AppResult<albums::Model> {
        let submitter = self
            .user_service
            .lookup_by_discord_id(&req.submitter_discord_id)
            .await?;

        let duplicate = albums::Entity::find()
            .filter(albums::Column::CatalogId.eq(&req.catalog_id))
            .one(&self.pool)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(format!(
                "Album {} has already been submitted",
                req.catalog_id
            )));
        }

        let album = albums::ActiveModel {
            catalog_id: Set(req.catalog_id.clone()),
            title: Set(req.title.clone()),
            artist: Set(req.artist.clone()),
            artist_url: Set(req.artist_url.clone()),
            cover_url: Set(req.cover_url.clone()),
            album_url: Set(req.album_url.clone()),
            submitted_by: Set(Some(submitter.id)),
            user_comment: Set(req.user_comment.clone()),
            submission_date: Set(Utc::now()),
            release_date: Set(req.release_date),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Album \"{}\" by {} submitted by {}",
            album.title,
            album.artist,
            req.submitter_discord_id
        );
        Ok(album)
    }

    pub async fn get_album(&self, catalog_id: &str) -> AppResult<albums::Model> {
        albums::Entity::find()
            .filter(albums::Column::CatalogId.eq(catalog_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Album {catalog_id} not found")))
    }

    pub async fn list_albums(&self) -> AppResult<Vec<albums::Model>> {
        Ok(albums::Entity::find()
            .order_by_asc(albums::Column::SubmissionDate)
            .all(&self.pool)
            .await?)
    }

    /// Remove a submission. An album that has ever been the pick is part of
    /// the historical record and cannot be deleted.
    pub async fn delete_album(&self, catalog_id: &str) -> AppResult<()> {
        let album = self.get_album(catalog_id).await?;

        let times_picked = daily_albums::Entity::find()
            .filter(daily_albums::Column::AlbumId.eq(album.id))
            .count(&self.pool)
            .await?;
        if times_picked > 0 {
            return Err(AppError::Conflict(format!(
                "Album {catalog_id} has been album of the day and cannot be deleted"
            )));
        }

        let title = album.title.clone();
        album.delete(&self.pool).await?;
        log::info!("Deleted submitted album \"{title}\" ({catalog_id})");
        Ok(())
    }
}
