use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

/// The current AOtD calendar day. All day-scoped logic (selection, streaks,
/// eligibility windows) runs on the UTC calendar.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn tomorrow() -> NaiveDate {
    today() + Days::new(1)
}

/// The upcoming midnight as an instant. Eligibility windows end here so a
/// user who is about to become blocked shows as blocked before the cutover.
pub fn next_midnight() -> DateTime<Utc> {
    let midnight = tomorrow().and_hms_opt(0, 0, 0).expect("valid midnight");
    Utc.from_utc_datetime(&midnight)
}
