//! Background scheduled jobs for the application.
//!
//! This module centralizes the recurring batch work (daily album selection
//! with yesterday's finalization, stale streak resets, and selection chance
//! refreshes). Call `spawn_all` once during startup to launch them.

use crate::error::AppError;
use crate::services::{ChanceService, SelectionService, StreakService};
use crate::utils::next_midnight;
use chrono::Utc;

/// Spawn all background tasks.
///
/// Notes
/// - Every job is safe to re-run: selection is guarded by the pick-per-day
///   uniqueness constraint, the other two are plain overwrites.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(
    selection_service: SelectionService,
    chance_service: ChanceService,
    streak_service: StreakService,
) {
    // Daily selection shortly after midnight, followed by streak resets and
    // a chance refresh so the site wakes up consistent
    {
        let selection = selection_service.clone();
        let streaks = streak_service.clone();
        let chances = chance_service.clone();
        tokio::spawn(async move {
            loop {
                let wait = (next_midnight() - Utc::now()).num_seconds().max(0) as u64 + 60;
                log::debug!("Next album of the day selection in {wait}s");
                tokio::time::sleep(std::time::Duration::from_secs(wait)).await;

                match selection.select_daily_pick().await {
                    Ok(pick) => {
                        log::info!("Selected album of the day for {}: album {}", pick.date, pick.album_id)
                    }
                    Err(AppError::AlreadySelected(msg)) => log::warn!("{msg}"),
                    Err(AppError::NoEligibleAlbums) => {
                        log::error!("No albums eligible for selection, no album will be picked today")
                    }
                    Err(e) => log::error!("Failed to select album of the day: {e:?}"),
                }
                if let Err(e) = streaks.reset_stale_streaks().await {
                    log::error!("Failed to reset stale streaks: {e:?}");
                }
                if let Err(e) = chances.refresh_all_chances().await {
                    log::error!("Failed to refresh selection chances: {e:?}");
                }
            }
        });
    }

    // Hourly chance refresh keeps the displayed percentages current as
    // reviews come in during the day
    {
        let chances = chance_service.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = chances.refresh_all_chances().await {
                    log::error!("Failed to refresh selection chances: {e:?}");
                }
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
        });
    }
}
