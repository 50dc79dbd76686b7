use crate::models::*;
use crate::services::{ReviewService, StreakService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review created or updated", body = ReviewResponse),
        (status = 400, description = "Invalid score or wrong album"),
        (status = 404, description = "No pick for today")
    )
)]
/// Submit today's review (a repeat submission edits the existing one)
pub async fn submit_review(
    service: web::Data<ReviewService>,
    body: web::Json<SubmitReviewRequest>,
) -> Result<HttpResponse> {
    match service.submit_review(&body.into_inner()).await {
        Ok(review) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "data": ReviewResponse::from(review) }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/reviews/album/{catalog_id}",
    tag = "reviews",
    params(
        ("catalog_id" = String, Path, description = "Album catalog id"),
        ("date" = Option<String>, Query, description = "Pick date (defaults to the album's most recent)")
    ),
    responses(
        (status = 200, description = "Reviews with reviewer streak data", body = [ReviewResponse])
    )
)]
/// All reviews of an album for a pick day
pub async fn get_reviews_for_album(
    service: web::Data<ReviewService>,
    path: web::Path<String>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse> {
    match service
        .reviews_for_album(&path.into_inner(), query.date)
        .await
    {
        Ok(list) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "review_list": list } })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/reviews/user/{discord_id}/album/{catalog_id}",
    tag = "reviews",
    params(
        ("discord_id" = String, Path, description = "Reviewer's Discord id"),
        ("catalog_id" = String, Path, description = "Album catalog id"),
        ("date" = Option<String>, Query, description = "Pick date (defaults to today)")
    ),
    responses(
        (status = 200, description = "The user's review, or null", body = ReviewResponse)
    )
)]
/// A single user's review of an album for a pick day
pub async fn get_user_review_for_album(
    service: web::Data<ReviewService>,
    path: web::Path<(String, String)>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse> {
    let (discord_id, catalog_id) = path.into_inner();
    match service
        .user_review_for_album(&discord_id, &catalog_id, query.date)
        .await
    {
        Ok(review) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": review }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/reviews/{id}/history",
    tag = "reviews",
    params(("id" = i64, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review with its edit trail", body = ReviewHistoryResponse),
        (status = 404, description = "Review not found")
    )
)]
/// A review plus all of its historical versions, newest first
pub async fn get_review_history(
    service: web::Data<ReviewService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.review_with_history(path.into_inner()).await {
        Ok(trail) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": trail }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/reviews/streaks/reset",
    tag = "reviews",
    responses((status = 200, description = "Stale streaks zeroed"))
)]
/// Zero streaks for users who missed the latest pick day (scheduler entry
/// point)
pub async fn reset_streaks(service: web::Data<StreakService>) -> Result<HttpResponse> {
    match service.reset_stale_streaks().await {
        Ok(count) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "reset": count } })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn review_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reviews")
            .route("", web::post().to(submit_review))
            .route("/album/{catalog_id}", web::get().to(get_reviews_for_album))
            .route(
                "/user/{discord_id}/album/{catalog_id}",
                web::get().to(get_user_review_for_album),
            )
            .route("/{id}/history", web::get().to(get_review_history))
            .route("/streaks/reset", web::post().to(reset_streaks)),
    );
}
