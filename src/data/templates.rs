//! Normalized intraday shape templates, one per day type.

use std::fmt;
use std::io::Read;

use chrono::TimeDelta;

use super::categories::CategoryMapping;
use crate::error::{LoadGenError, Result};
use crate::profile::LoadTable;

const MINUTES_PER_DAY: usize = 24 * 60;

/// Kind of calendar day, selecting which intraday template applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayType {
    Weekday,
    Saturday,
    Sunday,
    Holiday,
}

impl DayType {
    pub const ALL: [DayType; 4] = [
        DayType::Weekday,
        DayType::Saturday,
        DayType::Sunday,
        DayType::Holiday,
    ];

    /// Name of the source table (and CSV file stem) for this day type.
    pub fn table_name(self) -> &'static str {
        match self {
            DayType::Weekday => "Week_day",
            DayType::Saturday => "Saturday",
            DayType::Sunday => "Sunday",
            DayType::Holiday => "Holiday",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayType::Weekday => "weekday",
            DayType::Saturday => "saturday",
            DayType::Sunday => "sunday",
            DayType::Holiday => "holiday",
        };
        f.write_str(s)
    }
}

/// A normalized intraday shape: one row per interval, one column per
/// category, every value in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTypeTemplate {
    day_type: DayType,
    table: LoadTable,
}

impl DayTypeTemplate {
    /// Builds a template from category columns ordered like `mapping`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the template is empty, the column count
    /// differs from the category count, or a value lies outside `[0, 1]`.
    pub fn new(
        day_type: DayType,
        mapping: &CategoryMapping,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let table = LoadTable::from_columns(mapping.names().to_vec(), columns)?;
        if table.is_empty() {
            return Err(LoadGenError::validation(format!(
                "template {} has no rows",
                day_type.table_name()
            )));
        }
        for (name, col) in table.categories().iter().zip(table.columns()) {
            if let Some((row, v)) = col
                .iter()
                .enumerate()
                .find(|(_, v)| !(0.0..=1.0).contains(*v))
            {
                return Err(LoadGenError::validation(format!(
                    "template {} row {row}: value {v} for \"{name}\" outside [0, 1]",
                    day_type.table_name()
                )));
            }
        }
        Ok(Self { day_type, table })
    }

    /// Reads a template from CSV.
    ///
    /// Headers are normalized through `mapping`. A column named
    /// `index_column` is ignored. Fully blank rows are skipped; a blank cell in
    /// an otherwise filled row is an error.
    ///
    /// # Errors
    ///
    /// Returns a CSV error on malformed input, or a validation error on
    /// header or value problems.
    pub fn read_csv<R: Read>(
        reader: R,
        day_type: DayType,
        mapping: &CategoryMapping,
        index_column: Option<&str>,
        source: &str,
    ) -> Result<Self> {
        let csv_err = |e| LoadGenError::Csv {
            path: source.into(),
            source: e,
        };
        let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
        let headers = rdr.headers().map_err(csv_err)?.clone();

        let kept: Vec<(usize, &str)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| Some(h.trim()) != index_column)
            .collect();
        let slots = mapping.resolve_header(kept.iter().map(|(_, h)| *h), source)?;

        let mut columns = vec![Vec::new(); mapping.len()];
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(csv_err)?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            for ((pos, header), slot) in kept.iter().zip(&slots) {
                let Some(cat) = slot else { continue };
                let raw = record.get(*pos).unwrap_or("").trim();
                let value = raw.parse::<f64>().map_err(|_| {
                    LoadGenError::validation(format!(
                        "{source} row {}: \"{raw}\" in column \"{header}\" is not a number",
                        line + 1
                    ))
                })?;
                columns[*cat].push(value);
            }
        }

        Self::new(day_type, mapping, columns)
    }

    /// A template of the same shape where every interval equals 1.
    pub fn constant_like(&self) -> Self {
        Self {
            day_type: self.day_type,
            table: self.table.filled(1.0),
        }
    }

    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    pub fn table(&self) -> &LoadTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The four day-type templates with a common resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSet {
    weekday: DayTypeTemplate,
    saturday: DayTypeTemplate,
    sunday: DayTypeTemplate,
    holiday: DayTypeTemplate,
}

impl TemplateSet {
    /// Bundles four templates.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a template is passed in the wrong slot,
    /// the row counts differ, or the row count does not divide a day into
    /// whole minutes.
    pub fn new(
        weekday: DayTypeTemplate,
        saturday: DayTypeTemplate,
        sunday: DayTypeTemplate,
        holiday: DayTypeTemplate,
    ) -> Result<Self> {
        let set = Self {
            weekday,
            saturday,
            sunday,
            holiday,
        };
        let rows = set.weekday.len();
        for dt in DayType::ALL {
            let t = set.get(dt);
            if t.day_type() != dt {
                return Err(LoadGenError::validation(format!(
                    "template {} supplied for day type {dt}",
                    t.day_type().table_name()
                )));
            }
            if t.len() != rows {
                return Err(LoadGenError::validation(format!(
                    "template {} has {} intervals, {} has {rows}",
                    dt.table_name(),
                    t.len(),
                    DayType::Weekday.table_name()
                )));
            }
        }
        if MINUTES_PER_DAY % rows != 0 {
            return Err(LoadGenError::validation(format!(
                "{rows} intervals do not divide a day into whole minutes"
            )));
        }
        Ok(set)
    }

    pub fn get(&self, day_type: DayType) -> &DayTypeTemplate {
        match day_type {
            DayType::Weekday => &self.weekday,
            DayType::Saturday => &self.saturday,
            DayType::Sunday => &self.sunday,
            DayType::Holiday => &self.holiday,
        }
    }

    pub fn intervals_per_day(&self) -> usize {
        self.weekday.len()
    }

    /// Duration of one template interval.
    pub fn interval(&self) -> TimeDelta {
        TimeDelta::minutes((MINUTES_PER_DAY / self.intervals_per_day()) as i64)
    }
}
