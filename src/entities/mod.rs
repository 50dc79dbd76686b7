pub mod albums;
pub mod aotd_user_data;
pub mod daily_albums;
pub mod outages;
pub mod review_history;
pub mod reviews;
pub mod selection_chances;
pub mod users;

pub use albums as album_entity;
pub use aotd_user_data as aotd_user_entity;
pub use daily_albums as daily_album_entity;
pub use outages as outage_entity;
pub use review_history as review_history_entity;
pub use reviews as review_entity;
pub use selection_chances as selection_chance_entity;
pub use users as user_entity;

pub use daily_albums::RATING_PENDING;
