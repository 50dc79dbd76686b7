use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::aotd::get_album_of_day,
        handlers::aotd::get_album_of_day_for_date,
        handlers::aotd::select_album_of_day,
        handlers::aotd::select_album_of_day_admin,
        handlers::aotd::get_day_timeline,
        handlers::aotd::get_aotd_by_month,
        handlers::aotd::refresh_chances,
        handlers::aotd::get_chance,
        handlers::review::submit_review,
        handlers::review::get_reviews_for_album,
        handlers::review::get_user_review_for_album,
        handlers::review::get_review_history,
        handlers::review::reset_streaks,
        handlers::album::submit_album,
        handlers::album::list_albums,
        handlers::album::get_album,
        handlers::album::delete_album,
        handlers::album::get_aotd_dates,
        handlers::outage::create_outage,
        handlers::outage::get_outages,
        handlers::outage::get_current_outages,
        handlers::outage::delete_outage,
        handlers::user::enroll,
        handlers::user::get_user,
    ),
    components(
        schemas(
            UserResponse,
            EnrollRequest,
            UserStreakData,
            AlbumResponse,
            SubmitAlbumRequest,
            ReviewResponse,
            SubmitReviewRequest,
            ReviewVersionResponse,
            ReviewHistoryResponse,
            DailyPickResponse,
            TimelineEvent,
            TimelineEventType,
            SelectAdminRequest,
            MonthPick,
            MonthStats,
            MonthViewResponse,
            SubmitterSelectionCount,
            BlockType,
            ChanceResponse,
            CreateOutageRequest,
            OutageResponse,
        )
    ),
    tags(
        (name = "aotd", description = "Album of the day selection, timelines and chances"),
        (name = "reviews", description = "Review submission, history and streaks"),
        (name = "albums", description = "Album submission pool"),
        (name = "outages", description = "Selection outage windows"),
        (name = "users", description = "User directory and enrollment"),
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
