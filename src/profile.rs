//! Tabular load containers shared by all pipeline stages.
//!
//! A [`LoadTable`] holds one column per end-use category plus a derived
//! `Total` column. Day profiles are plain load tables; an
//! [`AnnualLoadProfile`] adds a timestamp index.

use chrono::{NaiveDateTime, TimeDelta};

use crate::data::DayType;
use crate::error::{LoadGenError, Result};

/// Name of the derived row-sum column in exports.
pub const TOTAL_COLUMN: &str = "Total";

/// Column-major load table: category columns plus their row-wise `Total`.
///
/// The `Total` column is always recomputed from the category columns after
/// a mutation, so it equals the row-wise sum exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTable {
    categories: Vec<String>,
    columns: Vec<Vec<f64>>,
    total: Vec<f64>,
}

/// Intraday profile for one day type.
pub type DayProfile = LoadTable;

impl LoadTable {
    /// Builds a table from category columns and computes `Total`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the number of names and columns differ
    /// or the columns have unequal lengths.
    pub fn from_columns(categories: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if categories.len() != columns.len() {
            return Err(LoadGenError::validation(format!(
                "{} category names for {} columns",
                categories.len(),
                columns.len()
            )));
        }
        let rows = columns.first().map_or(0, Vec::len);
        if let Some((i, _)) = columns.iter().enumerate().find(|(_, c)| c.len() != rows) {
            return Err(LoadGenError::validation(format!(
                "column \"{}\" has {} rows, expected {rows}",
                categories[i],
                columns[i].len()
            )));
        }
        let mut table = Self {
            categories,
            columns,
            total: Vec::new(),
        };
        table.recompute_total();
        Ok(table)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Returns the column for a category name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.categories
            .iter()
            .position(|c| c == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn total(&self) -> &[f64] {
        &self.total
    }

    /// Number of rows (intervals).
    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// Category values of one row, in category order.
    pub fn row(&self, idx: usize) -> impl Iterator<Item = f64> + '_ {
        self.columns.iter().map(move |c| c[idx])
    }

    /// Returns a copy with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| c.iter().map(|v| v * factor).collect())
            .collect();
        let mut table = Self {
            categories: self.categories.clone(),
            columns,
            total: Vec::new(),
        };
        table.recompute_total();
        table
    }

    /// Same categories and row count with every value set to `value`.
    pub fn filled(&self, value: f64) -> Self {
        let rows = self.len();
        let mut table = Self {
            categories: self.categories.clone(),
            columns: vec![vec![value; rows]; self.columns.len()],
            total: Vec::new(),
        };
        table.recompute_total();
        table
    }

    /// Multiplies row `i` of every category by `factors[i]`.
    ///
    /// Category proportions within a row are unchanged.
    pub(crate) fn scale_rows(&mut self, factors: &[f64]) {
        debug_assert_eq!(factors.len(), self.len());
        for col in &mut self.columns {
            for (v, f) in col.iter_mut().zip(factors) {
                *v *= f;
            }
        }
        self.recompute_total();
    }

    /// Appends the rows of `other` (same categories) to this table.
    pub(crate) fn extend_from(&mut self, other: &LoadTable) {
        debug_assert_eq!(self.categories, other.categories);
        for (dst, src) in self.columns.iter_mut().zip(&other.columns) {
            dst.extend_from_slice(src);
        }
        self.total.extend_from_slice(&other.total);
    }

    /// Adds `other` elementwise into this table.
    ///
    /// # Errors
    ///
    /// Returns a validation error if categories or row counts differ.
    pub fn add_assign(&mut self, other: &LoadTable) -> Result<()> {
        if self.categories != other.categories || self.len() != other.len() {
            return Err(LoadGenError::validation(
                "cannot add load tables with different categories or lengths",
            ));
        }
        for (dst, src) in self.columns.iter_mut().zip(&other.columns) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
        self.recompute_total();
        Ok(())
    }

    /// An empty table with the given categories, reserving `rows` capacity.
    pub(crate) fn with_capacity(categories: Vec<String>, rows: usize) -> Self {
        let columns = categories
            .iter()
            .map(|_| Vec::with_capacity(rows))
            .collect();
        Self {
            categories,
            columns,
            total: Vec::with_capacity(rows),
        }
    }

    fn recompute_total(&mut self) {
        let rows = self.columns.first().map_or(0, Vec::len);
        self.total = (0..rows)
            .map(|i| self.columns.iter().fold(0.0, |acc, c| acc + c[i]))
            .collect();
    }
}

/// The five intraday profiles produced by the shape stages.
#[derive(Debug, Clone, PartialEq)]
pub struct DayProfileSet {
    pub weekday: DayProfile,
    pub saturday: DayProfile,
    pub sunday: DayProfile,
    pub holiday: DayProfile,
    /// Share-weighted flat profile (every template interval set to 1).
    pub constant: DayProfile,
}

impl DayProfileSet {
    /// Returns the profile used for days of the given type.
    pub fn get(&self, day_type: DayType) -> &DayProfile {
        match day_type {
            DayType::Weekday => &self.weekday,
            DayType::Saturday => &self.saturday,
            DayType::Sunday => &self.sunday,
            DayType::Holiday => &self.holiday,
        }
    }

    /// Number of intervals per day.
    pub fn intervals_per_day(&self) -> usize {
        self.weekday.len()
    }
}

/// Full-year load series indexed by interval start time.
///
/// Values are mean power in kW over each interval.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualLoadProfile {
    year: i32,
    interval: TimeDelta,
    index: Vec<NaiveDateTime>,
    table: LoadTable,
}

impl AnnualLoadProfile {
    pub(crate) fn new(
        year: i32,
        interval: TimeDelta,
        index: Vec<NaiveDateTime>,
        table: LoadTable,
    ) -> Result<Self> {
        if index.len() != table.len() {
            return Err(LoadGenError::validation(format!(
                "index has {} timestamps for {} rows",
                index.len(),
                table.len()
            )));
        }
        Ok(Self {
            year,
            interval,
            index,
            table,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Length of one interval.
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    /// Interval length in hours.
    pub fn interval_hours(&self) -> f64 {
        self.interval.num_seconds() as f64 / 3600.0
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn table(&self) -> &LoadTable {
        &self.table
    }

    pub fn categories(&self) -> &[String] {
        self.table.categories()
    }

    pub fn total(&self) -> &[f64] {
        self.table.total()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.table.column(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Annual energy of the `Total` column in MWh.
    pub fn annual_energy_mwh(&self) -> f64 {
        self.table.total().iter().sum::<f64>() * self.interval_hours() / 1000.0
    }

    /// Returns a copy with every column multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            year: self.year,
            interval: self.interval,
            index: self.index.clone(),
            table: self.table.scaled(factor),
        }
    }

    pub(crate) fn table_mut(&mut self) -> &mut LoadTable {
        &mut self.table
    }

    /// Adds another profile of the same year and shape elementwise.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the profiles do not share an index.
    pub fn add_assign(&mut self, other: &AnnualLoadProfile) -> Result<()> {
        if self.index != other.index {
            return Err(LoadGenError::validation(
                "cannot add annual profiles with different time indices",
            ));
        }
        self.table.add_assign(&other.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LoadTable {
        LoadTable::from_columns(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0, 3.0], vec![0.5, 0.25, 0.0]],
        )
        .expect("valid table")
    }

    #[test]
    fn total_is_row_sum() {
        let t = table();
        assert_eq!(t.total(), &[1.5, 2.25, 3.0]);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn unequal_columns_rejected() {
        let err = LoadTable::from_columns(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![1.0]],
        );
        assert!(err.is_err());
    }

    #[test]
    fn name_count_mismatch_rejected() {
        let err = LoadTable::from_columns(vec!["a".into()], vec![vec![1.0], vec![2.0]]);
        assert!(err.is_err());
    }

    #[test]
    fn scaled_does_not_mutate_input() {
        let t = table();
        let s = t.scaled(2.0);
        assert_eq!(t.total(), &[1.5, 2.25, 3.0]);
        assert_eq!(s.total(), &[3.0, 4.5, 6.0]);
        assert_eq!(s.column("b"), Some(&[1.0, 0.5, 0.0][..]));
    }

    #[test]
    fn filled_keeps_shape() {
        let t = table();
        let ones = t.filled(1.0);
        assert_eq!(ones.categories(), t.categories());
        assert_eq!(ones.column("b"), Some(&[1.0, 1.0, 1.0][..]));
        assert_eq!(ones.total(), &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn scale_rows_keeps_proportions() {
        let mut t = table();
        t.scale_rows(&[2.0, 1.0, 0.5]);
        assert_eq!(t.column("a"), Some(&[2.0, 2.0, 1.5][..]));
        assert_eq!(t.column("b"), Some(&[1.0, 0.25, 0.0][..]));
        assert_eq!(t.total(), &[3.0, 2.25, 1.5]);
    }

    #[test]
    fn add_assign_requires_same_shape() {
        let mut t = table();
        let other = LoadTable::from_columns(vec!["a".into()], vec![vec![1.0, 1.0, 1.0]])
            .expect("valid table");
        assert!(t.add_assign(&other).is_err());
        let same = table();
        assert!(t.add_assign(&same).is_ok());
        assert_eq!(t.total(), &[3.0, 4.5, 6.0]);
    }
}
