//! Splitting national profiles between regions.

use serde::Deserialize;
use tracing::{info, warn};

use super::allocation::{AllocationTable, SplitBasis};
use crate::data::TemplateStore;
use crate::error::{LoadGenError, Result};
use crate::pipeline::{HolidayCalendar, PipelineRequest, run_pipeline};
use crate::profile::AnnualLoadProfile;

/// What to do when a region has no allocation for an industry type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// Report [`LoadGenError::AllocationAbsent`].
    #[default]
    Fail,
    /// Treat the region as holding none of the industry type.
    Zero,
}

/// Multiplies every category and `Total` by `factor`.
pub fn scale_to_region(profile: &AnnualLoadProfile, factor: f64) -> AnnualLoadProfile {
    profile.scaled(factor)
}

/// Scaling factor of one region, applying `policy` to absent allocations.
///
/// # Errors
///
/// Returns [`LoadGenError::RegionNotFound`] for an unknown region, and
/// [`LoadGenError::AllocationAbsent`] under [`AbsentPolicy::Fail`].
pub fn resolve_factor(
    table: &AllocationTable,
    industry_type: u32,
    region_id: &str,
    basis: SplitBasis,
    policy: AbsentPolicy,
) -> Result<f64> {
    match table.scaling_factor(industry_type, region_id, basis) {
        Err(LoadGenError::AllocationAbsent { .. }) if policy == AbsentPolicy::Zero => {
            warn!(industry_type, region_id, "allocation absent, using zero");
            Ok(0.0)
        }
        other => other,
    }
}

/// Regional share of a national profile of `industry_type`.
///
/// # Errors
///
/// See [`resolve_factor`].
pub fn disaggregate(
    national: &AnnualLoadProfile,
    table: &AllocationTable,
    industry_type: u32,
    region_id: &str,
    basis: SplitBasis,
    policy: AbsentPolicy,
) -> Result<AnnualLoadProfile> {
    let factor = resolve_factor(table, industry_type, region_id, basis, policy)?;
    Ok(scale_to_region(national, factor))
}

/// Share of one industry type in a regional total.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub industry_type: u32,
    pub factor: f64,
    pub energy_mwh: f64,
}

/// Sum of all industry types allocated to one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionProfile {
    pub region_id: String,
    pub profile: AnnualLoadProfile,
    pub contributions: Vec<Contribution>,
}

/// Runs the pipeline for every industry type allocated to `region_id` and
/// sums the regional shares.
///
/// `template` supplies year and fluctuation settings; its industry number is
/// replaced per industry type and its overrides are ignored. Industry types
/// absent from the sector table or with zero allocation in the region are
/// skipped.
///
/// # Errors
///
/// Returns [`LoadGenError::RegionNotFound`] for an unknown region, a
/// validation error if no industry type is both in the sector table and
/// allocated to the region, and any pipeline error.
pub fn region_profile(
    store: &TemplateStore,
    holidays: &HolidayCalendar,
    table: &AllocationTable,
    region_id: &str,
    basis: SplitBasis,
    template: &PipelineRequest,
) -> Result<RegionProfile> {
    if !table.contains_region(region_id) {
        return Err(LoadGenError::RegionNotFound(region_id.to_string()));
    }

    let mut industry_types: Vec<u32> = table
        .for_region(region_id)
        .map(|r| r.industry_type_id)
        .collect();
    industry_types.sort_unstable();
    industry_types.dedup();

    let mut total: Option<AnnualLoadProfile> = None;
    let mut contributions = Vec::with_capacity(industry_types.len());
    for industry_type in industry_types {
        if !store.sectors().contains(industry_type) {
            warn!(industry_type, region_id, "not in sector table, skipped");
            continue;
        }
        let factor = match table.scaling_factor(industry_type, region_id, basis) {
            Err(LoadGenError::AllocationAbsent { .. }) => {
                warn!(industry_type, region_id, %basis, "zero allocation, skipped");
                continue;
            }
            other => other?,
        };
        let request = PipelineRequest {
            industry_number: industry_type,
            overrides: Default::default(),
            ..template.clone()
        };
        let national = run_pipeline(store, holidays, &request)?.profile;
        let share = scale_to_region(&national, factor);
        contributions.push(Contribution {
            industry_type,
            factor,
            energy_mwh: share.annual_energy_mwh(),
        });
        match total.as_mut() {
            Some(acc) => acc.add_assign(&share)?,
            None => total = Some(share),
        }
    }

    let profile = total.ok_or_else(|| {
        LoadGenError::validation(format!(
            "region \"{region_id}\" has no allocated industry type in the sector table"
        ))
    })?;
    info!(
        region_id,
        industries = contributions.len(),
        energy_mwh = profile.annual_energy_mwh(),
        "regional profile assembled"
    );
    Ok(RegionProfile {
        region_id: region_id.to_string(),
        profile,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::Calendar;
    use crate::pipeline::assemble::assemble_year;
    use crate::profile::{DayProfileSet, LoadTable};
    use crate::regional::allocation::RegionalAllocation;
    use chrono::TimeDelta;

    fn national() -> AnnualLoadProfile {
        let day = LoadTable::from_columns(
            vec!["a".into(), "b".into()],
            vec![vec![3.0; 24], vec![1.0; 24]],
        )
        .expect("valid table");
        let set = DayProfileSet {
            weekday: day.clone(),
            saturday: day.clone(),
            sunday: day.clone(),
            holiday: day.clone(),
            constant: day,
        };
        let cal = Calendar::new(2019, &HolidayCalendar::german_national()).expect("calendar");
        assemble_year(&cal, &set, TimeDelta::hours(1)).expect("assembled")
    }

    fn row(region: &str, industry: u32, n_cap: f64) -> RegionalAllocation {
        RegionalAllocation {
            region_id: region.into(),
            region_name: region.into(),
            industry_type: format!("type {industry}"),
            industry_type_id: industry,
            n_sites: 1.0,
            n_cap,
        }
    }

    fn table() -> AllocationTable {
        AllocationTable::new(vec![row("A", 3, 60.0), row("B", 3, 40.0), row("B", 5, 10.0)])
    }

    #[test]
    fn regional_shares_add_up_to_national() {
        let p = national();
        let t = table();
        let mut sum = disaggregate(&p, &t, 3, "A", SplitBasis::Employees, AbsentPolicy::Fail)
            .expect("region A");
        let b = disaggregate(&p, &t, 3, "B", SplitBasis::Employees, AbsentPolicy::Fail)
            .expect("region B");
        sum.add_assign(&b).expect("same index");
        for (x, y) in sum.total().iter().zip(p.total()) {
            assert!((x - y).abs() < 1e-9);
        }
        assert_eq!(sum.categories(), p.categories());
    }

    #[test]
    fn absent_fails_or_zeroes_by_policy() {
        let p = national();
        let t = table();
        let err = disaggregate(&p, &t, 5, "A", SplitBasis::Employees, AbsentPolicy::Fail)
            .expect_err("absent");
        assert_eq!(err.kind(), ErrorKind::AllocationAbsent);

        let zero = disaggregate(&p, &t, 5, "A", SplitBasis::Employees, AbsentPolicy::Zero)
            .expect("zero policy");
        assert!(zero.total().iter().all(|v| *v == 0.0));
        assert_eq!(zero.len(), p.len());
    }

    #[test]
    fn unknown_region_is_not_found_under_both_policies() {
        let t = table();
        for policy in [AbsentPolicy::Fail, AbsentPolicy::Zero] {
            let err = resolve_factor(&t, 3, "Z", SplitBasis::Employees, policy)
                .expect_err("unknown region");
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn zero_national_total_is_absent() {
        let t = AllocationTable::new(vec![row("A", 7, 0.0)]);
        let err = t
            .scaling_factor(7, "A", SplitBasis::Employees)
            .expect_err("zero total");
        assert_eq!(err.kind(), ErrorKind::AllocationAbsent);
    }

    #[test]
    fn scaling_is_elementwise() {
        let p = national();
        let q = scale_to_region(&p, 0.25);
        assert_eq!(q.column("a").map(|c| c[0]), Some(0.75));
        assert_eq!(q.total()[10], 1.0);
    }
}
