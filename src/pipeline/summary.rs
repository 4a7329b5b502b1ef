//! Post-hoc statistics of an annual profile.

use std::fmt;

use super::calendar::Calendar;
use crate::data::DayType;
use crate::profile::AnnualLoadProfile;

/// Key figures of an annual profile, computed from the `Total` column.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub year: i32,
    /// Annual energy (MWh).
    pub energy_mwh: f64,
    /// Highest interval load (kW).
    pub peak_kw: f64,
    /// Lowest interval load (kW).
    pub base_kw: f64,
    /// Mean load (kW).
    pub mean_kw: f64,
    /// Mean over peak load.
    pub load_factor: f64,
    /// Energy divided by peak load (h).
    pub full_load_hours: f64,
    /// Days per type: weekday, Saturday, Sunday, holiday.
    pub day_counts: [usize; 4],
}

impl ProfileSummary {
    pub fn from_profile(profile: &AnnualLoadProfile, calendar: &Calendar) -> Self {
        let total = profile.total();
        let energy_mwh = profile.annual_energy_mwh();
        let (base_kw, peak_kw) = if total.is_empty() {
            (0.0, 0.0)
        } else {
            total
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(*v), hi.max(*v))
                })
        };
        let mean_kw = if total.is_empty() {
            0.0
        } else {
            total.iter().sum::<f64>() / total.len() as f64
        };
        let (load_factor, full_load_hours) = if peak_kw > 0.0 {
            (mean_kw / peak_kw, energy_mwh * 1000.0 / peak_kw)
        } else {
            (0.0, 0.0)
        };
        Self {
            year: profile.year(),
            energy_mwh,
            peak_kw,
            base_kw,
            mean_kw,
            load_factor,
            full_load_hours,
            day_counts: DayType::ALL.map(|t| calendar.count(t)),
        }
    }
}

impl fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Profile Summary {} ---", self.year)?;
        writeln!(f, "Annual energy:      {:.2} MWh", self.energy_mwh)?;
        writeln!(f, "Peak load:          {:.2} kW", self.peak_kw)?;
        writeln!(f, "Base load:          {:.2} kW", self.base_kw)?;
        writeln!(f, "Mean load:          {:.2} kW", self.mean_kw)?;
        writeln!(f, "Load factor:        {:.3}", self.load_factor)?;
        writeln!(f, "Full-load hours:    {:.0} h", self.full_load_hours)?;
        let [w, sa, su, h] = self.day_counts;
        write!(
            f,
            "Days:               {w} weekday, {sa} Saturday, {su} Sunday, {h} holiday"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assemble::assemble_year;
    use crate::pipeline::calendar::HolidayCalendar;
    use crate::profile::{DayProfileSet, LoadTable};
    use chrono::TimeDelta;

    #[test]
    fn flat_profile_has_unit_load_factor() {
        let day = LoadTable::from_columns(vec!["a".into()], vec![vec![2.0; 24]])
            .expect("valid table");
        let set = DayProfileSet {
            weekday: day.clone(),
            saturday: day.clone(),
            sunday: day.clone(),
            holiday: day.clone(),
            constant: day,
        };
        let cal = Calendar::new(2019, &HolidayCalendar::german_national()).expect("calendar");
        let year = assemble_year(&cal, &set, TimeDelta::hours(1)).expect("assembled");
        let s = ProfileSummary::from_profile(&year, &cal);
        assert!((s.load_factor - 1.0).abs() < 1e-12);
        assert!((s.full_load_hours - 8760.0).abs() < 1e-6);
        assert_eq!(s.day_counts.iter().sum::<usize>(), 365);
        assert!(!format!("{s}").is_empty());
    }
}
