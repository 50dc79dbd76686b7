use crate::models::*;
use crate::services::{AlbumService, SelectionService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/albums",
    tag = "albums",
    request_body = SubmitAlbumRequest,
    responses(
        (status = 200, description = "Album submitted", body = AlbumResponse),
        (status = 409, description = "Album already submitted")
    )
)]
/// Submit an album into the selection pool
pub async fn submit_album(
    service: web::Data<AlbumService>,
    body: web::Json<SubmitAlbumRequest>,
) -> Result<HttpResponse> {
    match service.submit_album(&body.into_inner()).await {
        Ok(album) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "data": AlbumResponse::from(album) }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/albums",
    tag = "albums",
    responses((status = 200, description = "All submitted albums", body = [AlbumResponse]))
)]
pub async fn list_albums(service: web::Data<AlbumService>) -> Result<HttpResponse> {
    match service.list_albums().await {
        Ok(list) => {
            let list: Vec<AlbumResponse> = list.into_iter().map(Into::into).collect();
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/albums/{catalog_id}",
    tag = "albums",
    params(("catalog_id" = String, Path, description = "Album catalog id")),
    responses(
        (status = 200, description = "The album", body = AlbumResponse),
        (status = 404, description = "Album not found")
    )
)]
pub async fn get_album(
    service: web::Data<AlbumService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.get_album(&path.into_inner()).await {
        Ok(album) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "data": AlbumResponse::from(album) }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/albums/{catalog_id}",
    tag = "albums",
    params(("catalog_id" = String, Path, description = "Album catalog id")),
    responses(
        (status = 200, description = "Album deleted"),
        (status = 409, description = "Album has been a pick and cannot be deleted")
    )
)]
/// Delete a submission (refused once the album has been a pick)
pub async fn delete_album(
    service: web::Data<AlbumService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.delete_album(&path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/albums/{catalog_id}/aotd-dates",
    tag = "albums",
    params(("catalog_id" = String, Path, description = "Album catalog id")),
    responses(
        (status = 200, description = "Dates the album was the pick")
    )
)]
/// Every date on which this album has been the pick
pub async fn get_aotd_dates(
    service: web::Data<SelectionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.aotd_dates(&path.into_inner()).await {
        Ok(dates) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "aotd_dates": dates } })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn album_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/albums")
            .route("", web::post().to(submit_album))
            .route("", web::get().to(list_albums))
            .route("/{catalog_id}/aotd-dates", web::get().to(get_aotd_dates))
            .route("/{catalog_id}", web::get().to(get_album))
            .route("/{catalog_id}", web::delete().to(delete_album)),
    );
}
