pub mod dates;
pub mod rounding;

pub use dates::{next_midnight, today, tomorrow};
pub use rounding::{is_on_grid, round_to_granularity, round2};
