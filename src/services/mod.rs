pub mod album_service;
pub mod chance_service;
pub mod outage_service;
pub mod rating_service;
pub mod review_service;
pub mod selection_service;
pub mod streak_service;
pub mod timeline_service;
pub mod user_service;

pub use album_service::AlbumService;
pub use chance_service::ChanceService;
pub use outage_service::OutageService;
pub use rating_service::RatingService;
pub use review_service::ReviewService;
pub use selection_service::SelectionService;
pub use streak_service::StreakService;
pub use timeline_service::TimelineService;
pub use user_service::UserService;

#[cfg(test)]
pub(crate) mod test_util;
