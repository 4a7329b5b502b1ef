//! Stage 4: scale to the sector's annual consumption and inject fluctuation.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::assemble::REFERENCE_ENERGY_MWH;
use crate::data::SectorParameters;
use crate::error::{LoadGenError, Result};
use crate::profile::AnnualLoadProfile;

/// Noise process settings for fluctuation injection.
///
/// The per-interval noise follows
/// ```text
/// e(t) = clamp(alpha * e(t-1) + (1 - alpha) * u(t), -1, 1),  u(t) ~ U[-1, 1]
/// ```
/// and every category of interval `t` is multiplied by `1 + a * e(t)`, with
/// `a` the fluctuation amplitude as a fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluctuationSettings {
    /// AR(1) persistence in `[0, 1)`; 0 yields white noise.
    pub alpha: f64,
    pub seed: u64,
}

impl Default for FluctuationSettings {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            seed: 42,
        }
    }
}

impl FluctuationSettings {
    /// Seed used for one industry type, decorrelating parallel runs.
    pub fn seed_for(&self, industry_number: u32) -> u64 {
        self.seed.wrapping_add(u64::from(industry_number))
    }
}

/// Scales a reference-normalized profile to the sector's annual consumption.
pub fn scale_to_consumption(
    normalized: &AnnualLoadProfile,
    parameters: &SectorParameters,
) -> AnnualLoadProfile {
    normalized.scaled(parameters.annual_consumption_mwh / REFERENCE_ENERGY_MWH)
}

/// Perturbs every interval by bounded, seeded noise and restores the annual
/// energy afterwards.
///
/// Values stay non-negative since the amplitude is below 100 %. All
/// categories of an interval share one factor, so `Total` stays their sum.
///
/// # Errors
///
/// Returns a validation error for an amplitude above 99 or `alpha` outside
/// `[0, 1)`.
pub fn inject_fluctuation(
    profile: &AnnualLoadProfile,
    amplitude_pct: u8,
    settings: &FluctuationSettings,
    seed: u64,
) -> Result<AnnualLoadProfile> {
    if amplitude_pct >= 100 {
        return Err(LoadGenError::validation(format!(
            "fluctuation amplitude {amplitude_pct} must be below 100"
        )));
    }
    if !(0.0..1.0).contains(&settings.alpha) {
        return Err(LoadGenError::validation(format!(
            "fluctuation alpha {} must be in [0, 1)",
            settings.alpha
        )));
    }
    if amplitude_pct == 0 || profile.is_empty() {
        return Ok(profile.clone());
    }

    let amplitude = f64::from(amplitude_pct) / 100.0;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = 0.0_f64;
    let factors: Vec<f64> = (0..profile.len())
        .map(|_| {
            let u: f64 = rng.random_range(-1.0..=1.0);
            state = (settings.alpha * state + (1.0 - settings.alpha) * u).clamp(-1.0, 1.0);
            1.0 + amplitude * state
        })
        .collect();

    let energy = profile.annual_energy_mwh();
    let mut out = profile.clone();
    out.table_mut().scale_rows(&factors);
    let perturbed = out.annual_energy_mwh();
    if perturbed > 0.0 {
        out = out.scaled(energy / perturbed);
    }
    debug!(amplitude_pct, seed, "fluctuation injected");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assemble::{assemble_year, normalize_to_reference};
    use crate::pipeline::calendar::{Calendar, HolidayCalendar};
    use crate::profile::{DayProfileSet, LoadTable};
    use chrono::TimeDelta;

    fn normalized() -> AnnualLoadProfile {
        let day = LoadTable::from_columns(
            vec!["a".into(), "b".into()],
            vec![
                (0..24).map(|h| 1.0 + h as f64 / 24.0).collect(),
                vec![0.5; 24],
            ],
        )
        .expect("valid table");
        let set = DayProfileSet {
            weekday: day.clone(),
            saturday: day.scaled(0.7),
            sunday: day.scaled(0.5),
            holiday: day.scaled(0.5),
            constant: day,
        };
        let cal = Calendar::new(2019, &HolidayCalendar::german_national()).expect("calendar");
        let year = assemble_year(&cal, &set, TimeDelta::hours(1)).expect("assembled");
        normalize_to_reference(&year).expect("normalized")
    }

    fn params(fluctuation: u8) -> SectorParameters {
        SectorParameters {
            industry_number: 3,
            name: "test".into(),
            wz_id: "17".into(),
            shares: vec![1.0, 1.0],
            fluctuation,
            annual_consumption_mwh: 2500.0,
            peak_factor: 0.0,
            base_factor: 0.0,
        }
    }

    #[test]
    fn scaling_hits_target() {
        let scaled = scale_to_consumption(&normalized(), &params(0));
        assert!((scaled.annual_energy_mwh() - 2500.0).abs() < 1e-6);
    }

    #[test]
    fn fluctuation_preserves_energy_and_sign() {
        let scaled = scale_to_consumption(&normalized(), &params(30));
        let out = inject_fluctuation(&scaled, 30, &FluctuationSettings::default(), 7)
            .expect("injected");
        assert!((out.annual_energy_mwh() - 2500.0).abs() < 1e-6);
        assert!(out.total().iter().all(|v| *v >= 0.0));
        assert_ne!(out.total(), scaled.total());
    }

    #[test]
    fn fluctuation_is_bounded() {
        let scaled = scale_to_consumption(&normalized(), &params(20));
        let out = inject_fluctuation(&scaled, 20, &FluctuationSettings::default(), 1)
            .expect("injected");
        // The renormalization factor stays within 1 % for a year of samples.
        for (a, b) in out.total().iter().zip(scaled.total()) {
            let r = a / b;
            assert!(
                r >= 0.8 * 0.99 && r <= 1.2 * 1.01,
                "ratio {r} out of bounds"
            );
        }
    }

    #[test]
    fn same_seed_same_result() {
        let scaled = scale_to_consumption(&normalized(), &params(25));
        let s = FluctuationSettings {
            alpha: 0.8,
            seed: 11,
        };
        let a = inject_fluctuation(&scaled, 25, &s, s.seed_for(3)).expect("injected");
        let b = inject_fluctuation(&scaled, 25, &s, s.seed_for(3)).expect("injected");
        let c = inject_fluctuation(&scaled, 25, &s, s.seed_for(4)).expect("injected");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_amplitude_is_noop() {
        let scaled = scale_to_consumption(&normalized(), &params(0));
        let out = inject_fluctuation(&scaled, 0, &FluctuationSettings::default(), 1)
            .expect("injected");
        assert_eq!(out, scaled);
    }

    #[test]
    fn invalid_alpha_rejected() {
        let scaled = scale_to_consumption(&normalized(), &params(10));
        let s = FluctuationSettings {
            alpha: 1.0,
            seed: 0,
        };
        assert!(inject_fluctuation(&scaled, 10, &s, 0).is_err());
    }
}
