use crate::models::*;
use crate::services::UserService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/users/enroll",
    tag = "users",
    request_body = EnrollRequest,
    responses((status = 200, description = "User enrolled", body = UserResponse))
)]
/// Enroll a user into album of the day (idempotent)
pub async fn enroll(
    service: web::Data<UserService>,
    body: web::Json<EnrollRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    match service.enroll(&req.discord_id, &req.nickname).await {
        Ok(user) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "data": UserResponse::from(user) }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/{discord_id}",
    tag = "users",
    params(("discord_id" = String, Path, description = "User's Discord id")),
    responses(
        (status = 200, description = "User with streak data", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
/// A user plus their AOtD streak data
pub async fn get_user(
    service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let discord_id = path.into_inner();
    let user = match service.lookup_by_discord_id(&discord_id).await {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match service.profile_for(&discord_id).await {
        Ok(profile) => {
            let streak = UserStreakData::from_profile(&profile, crate::utils::today());
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": {
                    "user": UserResponse::from(user),
                    "streak": streak,
                    "total_reviews": profile.total_reviews,
                    "review_score_average": profile.review_score_average,
                }
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/enroll", web::post().to(enroll))
            .route("/{discord_id}", web::get().to(get_user)),
    );
}
