pub mod album;
pub mod aotd;
pub mod chance;
pub mod outage;
pub mod review;
pub mod user;

pub use album::{AlbumResponse, SubmitAlbumRequest};
pub use aotd::{
    DailyPickResponse, MonthPick, MonthStats, MonthViewResponse, SelectAdminRequest,
    SubmitterSelectionCount, TimelineEvent, TimelineEventType,
};
pub use chance::{BlockType, ChanceResponse};
pub use outage::{CreateOutageRequest, OutageResponse};
pub use review::{
    ReviewHistoryResponse, ReviewResponse, ReviewVersionResponse, SubmitReviewRequest,
};
pub use user::{EnrollRequest, UserResponse, UserStreakData};
