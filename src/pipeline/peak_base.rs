//! Stage 2: vertical stretching of the day profiles to peak/base targets.
//!
//! The weekday profile is the reference day. With `m` its mean `Total` and
//! `x = Total / m`, the affine map
//!
//! ```text
//! x' = base + (x - x_min) * (peak - base) / (x_max - x_min)
//! ```
//!
//! sends the reference minimum to `base` and maximum to `peak`. The same map
//! is applied to all four day types, so their relative levels are kept.
//! Each interval's categories are multiplied by `x' / x`, which leaves the
//! category proportions of the interval unchanged. Mapped values below zero
//! are clamped to zero.

use tracing::{debug, warn};

use crate::data::SectorParameters;
use crate::error::{LoadGenError, Result};
use crate::profile::{DayProfile, DayProfileSet};

/// Reference days flatter than this are left untouched.
const FLAT_EPSILON: f64 = 1e-12;

/// The affine map derived from the reference day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakBaseMap {
    /// Mean `Total` of the reference day.
    pub mean: f64,
    pub x_min: f64,
    pub slope: f64,
    pub base: f64,
}

impl PeakBaseMap {
    /// Derives the map for a reference profile.
    ///
    /// Returns `Ok(None)` when no adjustment applies: both factors zero, a
    /// reference day without load, or a flat reference day.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the factors are set but
    /// `peak_factor > base_factor >= 0` does not hold.
    pub fn from_reference(
        reference: &DayProfile,
        peak_factor: f64,
        base_factor: f64,
    ) -> Result<Option<Self>> {
        if peak_factor == 0.0 && base_factor == 0.0 {
            return Ok(None);
        }
        if !(base_factor >= 0.0 && peak_factor > base_factor) {
            return Err(LoadGenError::validation(format!(
                "peak factor {peak_factor} must exceed base factor {base_factor} >= 0"
            )));
        }
        let total = reference.total();
        if total.is_empty() {
            return Ok(None);
        }
        let mean = total.iter().sum::<f64>() / total.len() as f64;
        if mean <= 0.0 {
            return Ok(None);
        }
        let (lo, hi) = total
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let (x_min, x_max) = (lo / mean, hi / mean);
        if x_max - x_min < FLAT_EPSILON {
            warn!("reference day is flat, skipping peak/base adjustment");
            return Ok(None);
        }
        Ok(Some(Self {
            mean,
            x_min,
            slope: (peak_factor - base_factor) / (x_max - x_min),
            base: base_factor,
        }))
    }

    /// Maps a `Total` value to its adjusted value.
    pub fn apply(&self, total: f64) -> f64 {
        let x = total / self.mean;
        (self.base + (x - self.x_min) * self.slope).max(0.0) * self.mean
    }

    /// Recovers the original `Total` from an unclamped adjusted value.
    pub fn invert(&self, adjusted: f64) -> f64 {
        let x = adjusted / self.mean;
        ((x - self.base) / self.slope + self.x_min) * self.mean
    }

    /// Returns a copy of `profile` with every interval rescaled.
    pub fn adjust(&self, profile: &DayProfile) -> DayProfile {
        let factors: Vec<f64> = profile
            .total()
            .iter()
            .map(|t| if *t > 0.0 { self.apply(*t) / t } else { 1.0 })
            .collect();
        let mut out = profile.clone();
        out.scale_rows(&factors);
        out
    }
}

/// Applies the peak/base adjustment to the four day-type profiles.
///
/// The constant profile is passed through unchanged.
///
/// # Errors
///
/// Returns a validation error for inconsistent peak/base factors.
pub fn adjust_peak_base(
    parameters: &SectorParameters,
    profiles: &DayProfileSet,
) -> Result<DayProfileSet> {
    let map = PeakBaseMap::from_reference(
        &profiles.weekday,
        parameters.peak_factor,
        parameters.base_factor,
    )?;
    let Some(map) = map else {
        debug!(
            industry_number = parameters.industry_number,
            "peak/base adjustment not applied"
        );
        return Ok(profiles.clone());
    };
    debug!(
        industry_number = parameters.industry_number,
        peak = parameters.peak_factor,
        base = parameters.base_factor,
        "peak/base adjustment"
    );
    Ok(DayProfileSet {
        weekday: map.adjust(&profiles.weekday),
        saturday: map.adjust(&profiles.saturday),
        sunday: map.adjust(&profiles.sunday),
        holiday: map.adjust(&profiles.holiday),
        constant: profiles.constant.clone(),
    })
}
