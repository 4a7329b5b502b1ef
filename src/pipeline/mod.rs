//! The four-stage synthesis pipeline.
//!
//! [`run_pipeline`] is a pure function of the reference data, the holiday
//! calendar and the request; independent runs may execute in parallel over a
//! shared `&TemplateStore`.

/// Stage 3: year assembly and reference normalization.
pub mod assemble;
pub mod calendar;
/// Stage 2: peak/base adjustment.
pub mod peak_base;
/// Stage 4: consumption scaling and fluctuation.
pub mod scale;
/// Stage 1: share-weighted day profiles.
pub mod shape;
pub mod summary;

use tracing::info;

use crate::data::{SectorOverrides, SectorParameters, TemplateStore};
use crate::error::Result;
use crate::profile::{AnnualLoadProfile, DayProfileSet};

pub use calendar::{Calendar, HolidayCalendar, HolidayRule};
pub use scale::FluctuationSettings;
pub use summary::ProfileSummary;

/// Inputs of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub industry_number: u32,
    pub year: i32,
    pub overrides: SectorOverrides,
    pub fluctuation: FluctuationSettings,
}

impl PipelineRequest {
    pub fn new(industry_number: u32, year: i32) -> Self {
        Self {
            industry_number,
            year,
            overrides: SectorOverrides::default(),
            fluctuation: FluctuationSettings::default(),
        }
    }
}

/// Every intermediate and final result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Sector parameters after overrides.
    pub parameters: SectorParameters,
    pub calendar: Calendar,
    /// Stage 1 output.
    pub shapes: DayProfileSet,
    /// Stage 2 output.
    pub adjusted: DayProfileSet,
    /// Stage 3 output, normalized to the reference consumption.
    pub normalized: AnnualLoadProfile,
    /// Stage 4 output before fluctuation.
    pub scaled: AnnualLoadProfile,
    /// Final profile.
    pub profile: AnnualLoadProfile,
}

/// Runs all four stages for one industry type and year.
///
/// # Errors
///
/// Returns [`crate::LoadGenError::IndustryNotFound`] for an unknown industry
/// and a validation error for invalid overrides, factors or years.
pub fn run_pipeline(
    store: &TemplateStore,
    holidays: &HolidayCalendar,
    request: &PipelineRequest,
) -> Result<PipelineOutput> {
    let shape::ShapeOutput {
        profiles: shapes,
        parameters,
    } = shape::synthesize_shapes(store, request.industry_number)?;
    let parameters = parameters.with_overrides(&request.overrides)?;

    let adjusted = peak_base::adjust_peak_base(&parameters, &shapes)?;

    let calendar = Calendar::new(request.year, holidays)?;
    let year = assemble::assemble_year(&calendar, &adjusted, store.templates().interval())?;
    let normalized = assemble::normalize_to_reference(&year)?;

    let scaled = scale::scale_to_consumption(&normalized, &parameters);
    let profile = scale::inject_fluctuation(
        &scaled,
        parameters.fluctuation,
        &request.fluctuation,
        request.fluctuation.seed_for(parameters.industry_number),
    )?;

    info!(
        industry_number = parameters.industry_number,
        year = request.year,
        energy_mwh = profile.annual_energy_mwh(),
        "pipeline finished"
    );
    Ok(PipelineOutput {
        parameters,
        calendar,
        shapes,
        adjusted,
        normalized,
        scaled,
        profile,
    })
}
