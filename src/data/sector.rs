//! Per-industry metadata: end-use shares and shaping parameters.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;

use super::categories::CategoryMapping;
use crate::error::{LoadGenError, Result};

pub const COL_INDUSTRY_NUMBER: &str = "industry_number";
pub const COL_NAME: &str = "Name";
pub const COL_WZ_ID: &str = "WZ_ID";
pub const COL_FLUCTUATION: &str = "Fluktuation";
pub const COL_PEAK_FACTOR: &str = "Peak_faktor";
pub const COL_BASE_FACTOR: &str = "Base_faktor";
/// Default name of the annual consumption column (MWh).
pub const DEFAULT_CONSUMPTION_COLUMN: &str = "Energieverbrauch 2019";

/// Largest accepted fluctuation amplitude, in percent.
pub const MAX_FLUCTUATION: u8 = 99;

/// Sector parameters for one industry type.
///
/// Treated as an immutable snapshot per pipeline run; use
/// [`SectorParameters::with_overrides`] to derive an adjusted copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorParameters {
    pub industry_number: u32,
    pub name: String,
    /// Official classification code of the industry type.
    pub wz_id: String,
    /// End-use weights, ordered like the category mapping.
    pub shares: Vec<f64>,
    /// Fluctuation amplitude in percent (0–99).
    pub fluctuation: u8,
    /// Target annual consumption (MWh).
    pub annual_consumption_mwh: f64,
    pub peak_factor: f64,
    pub base_factor: f64,
}

/// Caller-supplied replacements for individual sector parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectorOverrides {
    pub fluctuation: Option<u8>,
    pub annual_consumption_mwh: Option<f64>,
    pub peak_factor: Option<f64>,
    pub base_factor: Option<f64>,
}

impl SectorParameters {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative or non-finite shares,
    /// consumption or factors, or a fluctuation above 99.
    pub fn validate(&self) -> Result<()> {
        let n = self.industry_number;
        if let Some(s) = self.shares.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(LoadGenError::validation(format!(
                "industry {n}: end-use share {s} must be a non-negative number"
            )));
        }
        if self.fluctuation > MAX_FLUCTUATION {
            return Err(LoadGenError::validation(format!(
                "industry {n}: fluctuation {} exceeds {MAX_FLUCTUATION}",
                self.fluctuation
            )));
        }
        for (label, v) in [
            ("annual consumption", self.annual_consumption_mwh),
            ("peak factor", self.peak_factor),
            ("base factor", self.base_factor),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(LoadGenError::validation(format!(
                    "industry {n}: {label} {v} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    /// Returns a copy with the given overrides applied and validated.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the resulting parameters are invalid.
    pub fn with_overrides(&self, overrides: &SectorOverrides) -> Result<Self> {
        let mut p = self.clone();
        if let Some(f) = overrides.fluctuation {
            p.fluctuation = f;
        }
        if let Some(c) = overrides.annual_consumption_mwh {
            p.annual_consumption_mwh = c;
        }
        if let Some(f) = overrides.peak_factor {
            p.peak_factor = f;
        }
        if let Some(f) = overrides.base_factor {
            p.base_factor = f;
        }
        p.validate()?;
        Ok(p)
    }
}

/// All industry types, keyed by industry number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorTable {
    rows: BTreeMap<u32, SectorParameters>,
}

impl SectorTable {
    /// Builds a table from rows.
    ///
    /// # Errors
    ///
    /// Returns a validation error on duplicate industry numbers, a share
    /// vector of the wrong length, or invalid parameters.
    pub fn new(mapping: &CategoryMapping, rows: Vec<SectorParameters>) -> Result<Self> {
        let mut table = BTreeMap::new();
        for row in rows {
            if row.shares.len() != mapping.len() {
                return Err(LoadGenError::validation(format!(
                    "industry {}: {} shares for {} categories",
                    row.industry_number,
                    row.shares.len(),
                    mapping.len()
                )));
            }
            row.validate()?;
            let n = row.industry_number;
            if table.insert(n, row).is_some() {
                return Err(LoadGenError::validation(format!("industry number {n} listed twice")));
            }
        }
        Ok(Self { rows: table })
    }

    /// Reads the sector table from CSV.
    ///
    /// Columns are looked up by name. A blank numeric cell is read as 0;
    /// a missing column is an error.
    ///
    /// # Errors
    ///
    /// Returns a CSV error on malformed input or a validation error on
    /// missing columns and unparseable values.
    pub fn read_csv<R: Read>(
        reader: R,
        mapping: &CategoryMapping,
        consumption_column: &str,
        source: &str,
    ) -> Result<Self> {
        let csv_err = |e| LoadGenError::Csv {
            path: source.into(),
            source: e,
        };
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
        let headers = rdr.headers().map_err(csv_err)?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    LoadGenError::validation(format!("{source}: missing column \"{name}\""))
                })
        };

        let number_col = find(COL_INDUSTRY_NUMBER)?;
        let name_col = find(COL_NAME)?;
        let wz_col = find(COL_WZ_ID)?;
        let fluct_col = find(COL_FLUCTUATION)?;
        let peak_col = find(COL_PEAK_FACTOR)?;
        let base_col = find(COL_BASE_FACTOR)?;
        let cons_col = find(consumption_column)?;
        let share_cols = mapping
            .names()
            .iter()
            .map(|n| find(n.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(csv_err)?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let cell = |col: usize| record.get(col).unwrap_or("").trim();
            let number = |col: usize| -> Result<f64> {
                let raw = cell(col);
                if raw.is_empty() {
                    return Ok(0.0);
                }
                raw.parse::<f64>().map_err(|_| {
                    LoadGenError::validation(format!(
                        "{source} row {}: \"{raw}\" in column \"{}\" is not a number",
                        line + 1,
                        &headers[col]
                    ))
                })
            };

            let industry_number = cell(number_col).parse::<u32>().map_err(|_| {
                LoadGenError::validation(format!(
                    "{source} row {}: invalid industry number \"{}\"",
                    line + 1,
                    cell(number_col)
                ))
            })?;
            let fluctuation = number(fluct_col)?;
            if fluctuation.fract() != 0.0
                || !(0.0..=f64::from(MAX_FLUCTUATION)).contains(&fluctuation)
            {
                return Err(LoadGenError::validation(format!(
                    "industry {industry_number}: fluctuation {fluctuation} \
                     must be an integer in 0..={MAX_FLUCTUATION}"
                )));
            }

            rows.push(SectorParameters {
                industry_number,
                name: cell(name_col).to_string(),
                wz_id: cell(wz_col).to_string(),
                shares: share_cols
                    .iter()
                    .map(|c| number(*c))
                    .collect::<Result<Vec<_>>>()?,
                fluctuation: fluctuation as u8,
                annual_consumption_mwh: number(cons_col)?,
                peak_factor: number(peak_col)?,
                base_factor: number(base_col)?,
            });
        }

        Self::new(mapping, rows)
    }

    /// Looks up an industry type.
    ///
    /// # Errors
    ///
    /// Returns [`LoadGenError::IndustryNotFound`] for an unknown number.
    pub fn get(&self, industry_number: u32) -> Result<&SectorParameters> {
        self.rows
            .get(&industry_number)
            .ok_or(LoadGenError::IndustryNotFound(industry_number))
    }

    pub fn contains(&self, industry_number: u32) -> bool {
        self.rows.contains_key(&industry_number)
    }

    /// Finds an industry type by its human-readable name.
    pub fn find_by_name(&self, name: &str) -> Option<&SectorParameters> {
        self.rows.values().find(|p| p.name == name)
    }

    /// Industry types in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = &SectorParameters> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> CategoryMapping {
        CategoryMapping::new(
            vec!["IKT".into(), "Beleuchtung".into()],
            Default::default(),
            Default::default(),
        )
        .expect("valid mapping")
    }

    const HEADER: &str = "industry_number,Name,IKT,Beleuchtung,Fluktuation,\
                          Energieverbrauch 2019,Peak_faktor,Base_faktor,WZ_ID";

    const CSV: &str = "industry_number,Name,IKT,Beleuchtung,Fluktuation,\
                       Energieverbrauch 2019,Peak_faktor,Base_faktor,WZ_ID\n\
                       1,Metall,0.2,0.8,10,5000,1.5,0.4,24\n\
                       3,Papier,0.5,,0,1200,,,17\n";

    fn read(csv: &str) -> Result<SectorTable> {
        SectorTable::read_csv(
            csv.as_bytes(),
            &mapping(),
            DEFAULT_CONSUMPTION_COLUMN,
            "s.csv",
        )
    }

    #[test]
    fn reads_rows_and_fills_blanks_with_zero() {
        let table = read(CSV).expect("table parses");
        assert_eq!(table.len(), 2);
        let p = table.get(3).expect("industry 3 exists");
        assert_eq!(p.name, "Papier");
        assert_eq!(p.shares, vec![0.5, 0.0]);
        assert_eq!(p.peak_factor, 0.0);
        assert_eq!(p.wz_id, "17");
        assert_eq!(p.annual_consumption_mwh, 1200.0);
    }

    #[test]
    fn unknown_industry_is_not_found() {
        let table = read(CSV).expect("table parses");
        assert!(matches!(table.get(42), Err(LoadGenError::IndustryNotFound(42))));
    }

    #[test]
    fn missing_share_column_is_error() {
        let csv = "industry_number,Name,IKT,Fluktuation,\
                   Energieverbrauch 2019,Peak_faktor,Base_faktor,WZ_ID\n";
        let err = read(csv).expect_err("must fail");
        assert!(err.to_string().contains("Beleuchtung"));
    }

    #[test]
    fn fractional_fluctuation_rejected() {
        let csv = format!("{HEADER}\n1,Metall,0.2,0.8,10.5,5000,1.5,0.4,24\n");
        assert!(read(&csv).is_err());
    }

    #[test]
    fn negative_share_rejected() {
        let csv = format!("{HEADER}\n1,Metall,-0.2,0.8,10,5000,1.5,0.4,24\n");
        let err = read(&csv).expect_err("must fail");
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn overrides_produce_new_snapshot() {
        let table = read(CSV).expect("table parses");
        let base = table.get(1).expect("industry 1 exists");
        let o = SectorOverrides {
            fluctuation: Some(0),
            annual_consumption_mwh: Some(100.0),
            ..SectorOverrides::default()
        };
        let p = base.with_overrides(&o).expect("overrides valid");
        assert_eq!(p.fluctuation, 0);
        assert_eq!(p.annual_consumption_mwh, 100.0);
        assert_eq!(p.peak_factor, 1.5);
        assert_eq!(base.fluctuation, 10);
    }

    #[test]
    fn negative_override_rejected() {
        let table = read(CSV).expect("table parses");
        let o = SectorOverrides {
            peak_factor: Some(-1.0),
            ..SectorOverrides::default()
        };
        assert!(table.get(1).expect("exists").with_overrides(&o).is_err());
    }
}
