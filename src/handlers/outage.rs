use crate::models::*;
use crate::services::OutageService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/outages",
    tag = "outages",
    request_body = CreateOutageRequest,
    responses(
        (status = 200, description = "Outage scheduled", body = OutageResponse),
        (status = 400, description = "Invalid dates or insufficient lead time")
    )
)]
/// Schedule a selection outage for a user
pub async fn create_outage(
    service: web::Data<OutageService>,
    body: web::Json<CreateOutageRequest>,
) -> Result<HttpResponse> {
    match service.create_outage(&body.into_inner()).await {
        Ok(outage) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "data": OutageResponse::from(outage) }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/outages",
    tag = "outages",
    responses((status = 200, description = "All outages", body = [OutageResponse]))
)]
pub async fn get_outages(service: web::Data<OutageService>) -> Result<HttpResponse> {
    match service.list_outages().await {
        Ok(list) => {
            let list: Vec<OutageResponse> = list.into_iter().map(Into::into).collect();
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/outages/current",
    tag = "outages",
    responses((status = 200, description = "Outages active today", body = [OutageResponse]))
)]
pub async fn get_current_outages(service: web::Data<OutageService>) -> Result<HttpResponse> {
    match service.outages_active_on(crate::utils::today()).await {
        Ok(list) => {
            let list: Vec<OutageResponse> = list.into_iter().map(Into::into).collect();
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/outages/{id}",
    tag = "outages",
    params(("id" = i64, Path, description = "Outage id")),
    responses(
        (status = 200, description = "Outage deleted"),
        (status = 404, description = "Outage not found")
    )
)]
pub async fn delete_outage(
    service: web::Data<OutageService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.delete_outage(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn outage_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/outages")
            .route("", web::post().to(create_outage))
            .route("", web::get().to(get_outages))
            .route("/current", web::get().to(get_current_outages))
            .route("/{id}", web::delete().to(delete_outage)),
    );
}
