//! Day-type calendar for a target year.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Deserialize;

use crate::data::DayType;
use crate::error::{LoadGenError, Result};

/// How the holiday set of a year is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayRule {
    /// Nationwide German public holidays, plus any configured extra dates.
    #[default]
    GermanNational,
    /// Only the configured dates.
    Explicit,
}

/// Holiday data: a rule plus explicitly configured dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    rule: HolidayRule,
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(rule: HolidayRule, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            rule,
            dates: dates.into_iter().collect(),
        }
    }

    /// Nationwide German holidays only.
    pub fn german_national() -> Self {
        Self::new(HolidayRule::GermanNational, [])
    }

    /// Exactly the given dates.
    pub fn explicit(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self::new(HolidayRule::Explicit, dates)
    }

    pub fn rule(&self) -> HolidayRule {
        self.rule
    }

    /// All holidays falling in `year`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the year is outside the supported range.
    pub fn holidays_in(&self, year: i32) -> Result<BTreeSet<NaiveDate>> {
        let mut set: BTreeSet<NaiveDate> = self
            .dates
            .iter()
            .filter(|d| d.year() == year)
            .copied()
            .collect();
        if self.rule == HolidayRule::GermanNational {
            set.extend(german_national_holidays(year)?);
        }
        Ok(set)
    }
}

/// Easter Sunday (Gregorian calendar, anonymous algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// The nine public holidays observed in every German state.
///
/// # Errors
///
/// Returns a validation error if the year is outside the supported range.
pub fn german_national_holidays(year: i32) -> Result<Vec<NaiveDate>> {
    let out_of_range = || LoadGenError::validation(format!("year {year} is out of range"));
    let ymd = |m: u32, d: u32| NaiveDate::from_ymd_opt(year, m, d).ok_or_else(out_of_range);
    let easter = easter_sunday(year).ok_or_else(out_of_range)?;
    let before = |n: u64| {
        easter
            .checked_sub_days(Days::new(n))
            .ok_or_else(out_of_range)
    };
    let after = |n: u64| {
        easter
            .checked_add_days(Days::new(n))
            .ok_or_else(out_of_range)
    };

    Ok(vec![
        ymd(1, 1)?,   // Neujahr
        before(2)?,   // Karfreitag
        after(1)?,    // Ostermontag
        ymd(5, 1)?,   // Tag der Arbeit
        after(39)?,   // Christi Himmelfahrt
        after(50)?,   // Pfingstmontag
        ymd(10, 3)?,  // Tag der Deutschen Einheit
        ymd(12, 25)?, // 1. Weihnachtstag
        ymd(12, 26)?, // 2. Weihnachtstag
    ])
}

/// Every date of a year with its day type, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    year: i32,
    days: Vec<(NaiveDate, DayType)>,
}

impl Calendar {
    /// Builds the calendar of `year`.
    ///
    /// Holidays take precedence over Sundays, Sundays over Saturdays.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the year is outside the supported range.
    pub fn new(year: i32, holidays: &HolidayCalendar) -> Result<Self> {
        let holiday_set = holidays.holidays_in(year)?;
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| LoadGenError::validation(format!("year {year} is out of range")))?;
        let days = first
            .iter_days()
            .take_while(|d| d.year() == year)
            .map(|d| (d, classify(d, &holiday_set)))
            .collect();
        Ok(Self { year, days })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn days(&self) -> &[(NaiveDate, DayType)] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Day type of a date in this calendar's year.
    pub fn day_type(&self, date: NaiveDate) -> Option<DayType> {
        if date.year() != self.year {
            return None;
        }
        self.days.get(date.ordinal0() as usize).map(|(_, t)| *t)
    }

    /// Number of days of the given type.
    pub fn count(&self, day_type: DayType) -> usize {
        self.days.iter().filter(|(_, t)| *t == day_type).count()
    }
}

fn classify(date: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> DayType {
    if holidays.contains(&date) {
        return DayType::Holiday;
    }
    match date.weekday() {
        Weekday::Sun => DayType::Sunday,
        Weekday::Sat => DayType::Saturday,
        _ => DayType::Weekday,
    }
}
