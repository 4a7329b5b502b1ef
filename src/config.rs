//! TOML-based run configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::categories::{DEFAULT_CATEGORIES, DEFAULT_EXCLUDED, DEFAULT_RENAMES};
use crate::data::sector::{DEFAULT_CONSUMPTION_COLUMN, MAX_FLUCTUATION};
use crate::data::{CategoryMapping, DataSource, SectorOverrides};
use crate::error::{LoadGenError, Result};
use crate::pipeline::{FluctuationSettings, HolidayCalendar, HolidayRule, PipelineRequest};
use crate::regional::{AbsentPolicy, SplitBasis};

/// Top-level run configuration parsed from TOML.
///
/// Every section has defaults, so an empty file is a valid configuration
/// apart from the missing industry number. Relative paths in a file are
/// resolved against the file's directory by [`RunConfig::from_toml_file`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Reference data locations.
    #[serde(default)]
    pub data: DataConfig,
    /// End-use category set and template header rules.
    #[serde(default)]
    pub categories: CategoriesConfig,
    /// Industry and year to synthesize.
    #[serde(default)]
    pub run: RunSection,
    /// Replacements for sector table values.
    #[serde(default)]
    pub overrides: SectorOverrides,
    #[serde(default)]
    pub fluctuation: FluctuationConfig,
    #[serde(default)]
    pub holidays: HolidaysConfig,
    /// Regional disaggregation inputs and options.
    #[serde(default)]
    pub regional: RegionalConfig,
    /// Export destinations; unset entries are not written.
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Directory with the four day-type template files.
    pub template_dir: PathBuf,
    pub sector_table: PathBuf,
    /// Sector table column holding annual consumption (MWh).
    pub consumption_column: String,
    /// Template column to ignore.
    pub index_column: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("data/templates"),
            sector_table: PathBuf::from("data/sectors.csv"),
            consumption_column: DEFAULT_CONSUMPTION_COLUMN.to_string(),
            index_column: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesConfig {
    pub names: Vec<String>,
    /// Template columns dropped before synthesis.
    pub excluded: Vec<String>,
    /// Template columns renamed before synthesis.
    pub renames: BTreeMap<String, String>,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        Self {
            names: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            excluded: DEFAULT_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            renames: DEFAULT_RENAMES
                .iter()
                .map(|(f, t)| (f.to_string(), t.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Industry number from the sector table.
    pub industry: Option<u32>,
    pub year: i32,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            industry: None,
            year: 2019,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluctuationConfig {
    /// AR(1) persistence in `[0, 1)`.
    pub alpha: f64,
    /// Base seed; the industry number is added per run.
    pub seed: u64,
}

impl Default for FluctuationConfig {
    fn default() -> Self {
        let d = FluctuationSettings::default();
        Self {
            alpha: d.alpha,
            seed: d.seed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HolidaysConfig {
    pub rule: HolidayRule,
    /// Extra holidays as `"YYYY-MM-DD"` strings.
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionalConfig {
    /// Per-region site and employee counts by fine sector category.
    pub site_counts: Option<PathBuf>,
    /// Fine category to industry type shares.
    pub shares: Option<PathBuf>,
    pub region: Option<String>,
    pub split_by: SplitBasis,
    pub absent: AbsentPolicy,
    /// Sum all industry types of the region instead of one.
    pub region_total: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub profile: Option<PathBuf>,
    pub regional: Option<PathBuf>,
    pub allocation: Option<PathBuf>,
    pub day_profiles: Option<PathBuf>,
}

/// A configuration problem at a dotted field path.
#[derive(Debug)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl RunConfig {
    /// Parses a TOML file and resolves its relative paths against the
    /// file's directory.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            cfg.resolve_paths(base);
        }
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Prefixes every relative path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.data.template_dir);
        fix(&mut self.data.sector_table);
        for p in [
            &mut self.regional.site_counts,
            &mut self.regional.shares,
            &mut self.output.profile,
            &mut self.output.regional,
            &mut self.output.allocation,
            &mut self.output.day_profiles,
        ]
        .into_iter()
        .flatten()
        {
            fix(p);
        }
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.data.consumption_column.trim().is_empty() {
            errors.push(ConfigError::new("data.consumption_column", "must not be empty"));
        }
        if let Err(e) = self.category_mapping() {
            errors.push(ConfigError::new("categories", e.to_string()));
        }

        let year = self.run.year;
        if NaiveDate::from_ymd_opt(year, 1, 1).is_none() {
            errors.push(ConfigError::new("run.year", format!("{year} is out of range")));
        }

        let o = &self.overrides;
        if o.fluctuation.is_some_and(|f| f > MAX_FLUCTUATION) {
            errors.push(ConfigError::new(
                "overrides.fluctuation",
                format!("must be <= {MAX_FLUCTUATION}"),
            ));
        }
        for (field, value) in [
            ("overrides.annual_consumption_mwh", o.annual_consumption_mwh),
            ("overrides.peak_factor", o.peak_factor),
            ("overrides.base_factor", o.base_factor),
        ] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                errors.push(ConfigError::new(field, "must be a non-negative number"));
            }
        }
        if let (Some(peak), Some(base)) = (o.peak_factor, o.base_factor) {
            if (peak, base) != (0.0, 0.0) && peak <= base {
                errors.push(ConfigError::new(
                    "overrides.peak_factor",
                    "must be > overrides.base_factor",
                ));
            }
        }

        if !(0.0..1.0).contains(&self.fluctuation.alpha) {
            errors.push(ConfigError::new("fluctuation.alpha", "must be in [0.0, 1.0)"));
        }

        if self.holidays.rule == HolidayRule::Explicit && self.holidays.dates.is_empty() {
            errors.push(ConfigError::new(
                "holidays.dates",
                "must list at least one date for the explicit rule",
            ));
        }

        let r = &self.regional;
        if r.region.is_some() {
            if r.site_counts.is_none() {
                errors.push(ConfigError::new(
                    "regional.site_counts",
                    "required when a region is set",
                ));
            }
            if r.shares.is_none() {
                errors.push(ConfigError::new("regional.shares", "required when a region is set"));
            }
        } else if r.region_total {
            errors.push(ConfigError::new("regional.region_total", "requires regional.region"));
        }
        if self.output.regional.is_some() && r.region.is_none() {
            errors.push(ConfigError::new("output.regional", "requires regional.region"));
        }
        if self.output.allocation.is_some() && (r.site_counts.is_none() || r.shares.is_none()) {
            errors.push(ConfigError::new(
                "output.allocation",
                "requires regional.site_counts and regional.shares",
            ));
        }

        errors
    }

    /// Builds the category mapping from `[categories]`.
    ///
    /// # Errors
    ///
    /// See [`CategoryMapping::new`].
    pub fn category_mapping(&self) -> Result<CategoryMapping> {
        let c = &self.categories;
        CategoryMapping::new(
            c.names.clone(),
            c.excluded.iter().cloned().collect(),
            c.renames.clone(),
        )
    }

    /// Builds the reference data description from `[data]` and
    /// `[categories]`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid category set.
    pub fn data_source(&self) -> Result<DataSource> {
        Ok(DataSource {
            template_dir: self.data.template_dir.clone(),
            sector_table: self.data.sector_table.clone(),
            consumption_column: self.data.consumption_column.clone(),
            index_column: self.data.index_column.clone(),
            categories: self.category_mapping()?,
        })
    }

    pub fn holiday_calendar(&self) -> HolidayCalendar {
        HolidayCalendar::new(self.holidays.rule, self.holidays.dates.iter().copied())
    }

    /// Pipeline request for the configured industry and year.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no industry number is configured.
    pub fn request(&self) -> Result<PipelineRequest> {
        let industry = self
            .run
            .industry
            .ok_or_else(|| LoadGenError::validation("no industry number configured"))?;
        Ok(PipelineRequest {
            industry_number: industry,
            year: self.run.year,
            overrides: self.overrides.clone(),
            fluctuation: self.fluctuation_settings(),
        })
    }

    pub fn fluctuation_settings(&self) -> FluctuationSettings {
        FluctuationSettings {
            alpha: self.fluctuation.alpha,
            seed: self.fluctuation.seed,
        }
    }
}
