use crate::error::AppError;
use crate::models::*;
use crate::services::{ChanceService, SelectionService, TimelineService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError(format!("Invalid date: {raw}")))
}

#[utoipa::path(
    get,
    path = "/aotd",
    tag = "aotd",
    responses(
        (status = 200, description = "Today's album of the day", body = DailyPickResponse),
        (status = 404, description = "No pick for today")
    )
)]
/// Today's album of the day
pub async fn get_album_of_day(service: web::Data<SelectionService>) -> Result<HttpResponse> {
    match service.pick_for_date(crate::utils::today()).await {
        Ok(pick) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": pick }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/aotd/{date}",
    tag = "aotd",
    params(("date" = String, Path, description = "Pick date (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Album of the day for the date", body = DailyPickResponse),
        (status = 404, description = "No pick for that date")
    )
)]
/// Album of the day for a specific date
pub async fn get_album_of_day_for_date(
    service: web::Data<SelectionService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let date = match parse_date(&path.into_inner()) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.pick_for_date(date).await {
        Ok(pick) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": pick }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/aotd/select",
    tag = "aotd",
    responses(
        (status = 200, description = "Album selected", body = DailyPickResponse),
        (status = 425, description = "Already selected for today"),
        (status = 404, description = "No eligible albums")
    )
)]
/// Run the daily selection (scheduler entry point)
pub async fn select_album_of_day(service: web::Data<SelectionService>) -> Result<HttpResponse> {
    match service.select_daily_pick().await {
        Ok(pick) => match service.pick_for_date(pick.date).await {
            Ok(full) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": full }))),
            Err(e) => Ok(e.error_response()),
        },
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/aotd/admin/{date}/{catalog_id}",
    tag = "aotd",
    params(
        ("date" = String, Path, description = "Pick date (YYYY-MM-DD)"),
        ("catalog_id" = String, Path, description = "Album catalog id")
    ),
    request_body = SelectAdminRequest,
    responses(
        (status = 200, description = "Pick overridden", body = DailyPickResponse)
    )
)]
/// Admin override: force the pick for any date, replacing an existing one
pub async fn select_album_of_day_admin(
    service: web::Data<SelectionService>,
    path: web::Path<(String, String)>,
    body: web::Json<SelectAdminRequest>,
) -> Result<HttpResponse> {
    let (raw_date, catalog_id) = path.into_inner();
    let date = match parse_date(&raw_date) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .select_daily_pick_admin(date, &catalog_id, body.into_inner().admin_message)
        .await
    {
        Ok(pick) => match service.pick_for_date(pick.date).await {
            Ok(full) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": full }))),
            Err(e) => Ok(e.error_response()),
        },
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/aotd/timeline/{date}",
    tag = "aotd",
    params(("date" = String, Path, description = "Pick date (YYYY-MM-DD)")),
    responses(
        (status = 200, description = "Rating timeline for the date", body = [TimelineEvent])
    )
)]
/// Rating timeline for a pick day (rebuilt on read if a past day was never
/// finalized)
pub async fn get_day_timeline(
    service: web::Data<TimelineService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let date = match parse_date(&path.into_inner()) {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_timeline(date).await {
        Ok(events) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "timeline": events } })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct MonthPath {
    pub year: i32,
    pub month: u32,
}

#[utoipa::path(
    get,
    path = "/aotd/month/{year}/{month}",
    tag = "aotd",
    params(
        ("year" = i32, Path, description = "Year"),
        ("month" = u32, Path, description = "Month (1-12)")
    ),
    responses(
        (status = 200, description = "Picks and stats for the month", body = MonthViewResponse)
    )
)]
/// All picks in a month (up to today) with ratings and submitter stats
pub async fn get_aotd_by_month(
    service: web::Data<SelectionService>,
    path: web::Path<MonthPath>,
) -> Result<HttpResponse> {
    let MonthPath { year, month } = path.into_inner();
    if !(1..=12).contains(&month) {
        return Ok(AppError::ValidationError(format!("Invalid month: {month}"))
            .error_response());
    }
    match service.picks_for_month(year, month).await {
        Ok(view) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": view }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/aotd/chances/refresh",
    tag = "aotd",
    responses((status = 200, description = "Chances recalculated"))
)]
/// Batch-recompute every participant's cached selection chance (scheduler
/// entry point)
pub async fn refresh_chances(service: web::Data<ChanceService>) -> Result<HttpResponse> {
    match service.refresh_all_chances().await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/aotd/chances/{discord_id}",
    tag = "aotd",
    params(("discord_id" = String, Path, description = "User's Discord id")),
    responses(
        (status = 200, description = "Cached selection chance", body = ChanceResponse),
        (status = 404, description = "User unknown or chances not yet calculated")
    )
)]
/// Cached selection chance for a user (never recomputes inline)
pub async fn get_chance(
    service: web::Data<ChanceService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.get_chance(&path.into_inner()).await {
        Ok(chance) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": chance }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn aotd_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/aotd")
            .route("/select", web::post().to(select_album_of_day))
            .route(
                "/admin/{date}/{catalog_id}",
                web::post().to(select_album_of_day_admin),
            )
            .route("/timeline/{date}", web::get().to(get_day_timeline))
            .route("/month/{year}/{month}", web::get().to(get_aotd_by_month))
            .route("/chances/refresh", web::post().to(refresh_chances))
            .route("/chances/{discord_id}", web::get().to(get_chance))
            .route("/{date}", web::get().to(get_album_of_day_for_date))
            .route("", web::get().to(get_album_of_day)),
    );
}
