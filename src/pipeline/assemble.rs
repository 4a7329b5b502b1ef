//! Stage 3: concatenate day profiles along the calendar and normalize the
//! year to the reference consumption.

use chrono::{NaiveTime, TimeDelta};
use tracing::debug;

use super::calendar::Calendar;
use crate::error::{LoadGenError, Result};
use crate::profile::{AnnualLoadProfile, DayProfileSet, LoadTable};

/// Reference annual consumption of the normalized profile (MWh).
pub const REFERENCE_ENERGY_MWH: f64 = 1000.0;

/// Lays out one day profile per calendar date.
///
/// Row `i` of the result starts at `date 00:00 + i * interval` within its day,
/// so the index is contiguous across the whole year.
///
/// # Errors
///
/// Returns a validation error if `intervals_per_day * interval` is not one day.
pub fn assemble_year(
    calendar: &Calendar,
    profiles: &DayProfileSet,
    interval: TimeDelta,
) -> Result<AnnualLoadProfile> {
    let per_day = profiles.intervals_per_day();
    if interval * per_day as i32 != TimeDelta::days(1) {
        return Err(LoadGenError::validation(format!(
            "{per_day} intervals of {} minutes do not cover one day",
            interval.num_minutes()
        )));
    }

    let rows = calendar.len() * per_day;
    let mut table = LoadTable::with_capacity(profiles.weekday.categories().to_vec(), rows);
    let mut index = Vec::with_capacity(rows);
    for (date, day_type) in calendar.days() {
        let start = date.and_time(NaiveTime::MIN);
        index.extend((0..per_day).map(|i| start + interval * i as i32));
        table.extend_from(profiles.get(*day_type));
    }
    debug!(year = calendar.year(), rows, "year assembled");
    AnnualLoadProfile::new(calendar.year(), interval, index, table)
}

/// Rescales all columns by one factor so the annual `Total` energy equals
/// `target_mwh`.
///
/// # Errors
///
/// Returns a validation error if the profile carries no energy.
pub fn normalize_energy(profile: &AnnualLoadProfile, target_mwh: f64) -> Result<AnnualLoadProfile> {
    let energy = profile.annual_energy_mwh();
    if !(energy > 0.0) {
        return Err(LoadGenError::validation(format!(
            "profile for {} has no energy to normalize",
            profile.year()
        )));
    }
    Ok(profile.scaled(target_mwh / energy))
}

/// Normalizes to [`REFERENCE_ENERGY_MWH`].
///
/// # Errors
///
/// See [`normalize_energy`].
pub fn normalize_to_reference(profile: &AnnualLoadProfile) -> Result<AnnualLoadProfile> {
    normalize_energy(profile, REFERENCE_ENERGY_MWH)
}
