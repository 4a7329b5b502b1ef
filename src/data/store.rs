//! In-memory reference data: templates, sector table and category mapping.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::categories::CategoryMapping;
use super::sector::{DEFAULT_CONSUMPTION_COLUMN, SectorTable};
use super::templates::{DayType, DayTypeTemplate, TemplateSet};
use crate::error::{LoadGenError, Result};

/// Where and how to read the reference data. Doubles as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataSource {
    /// Directory holding `Week_day.csv`, `Saturday.csv`, `Sunday.csv` and `Holiday.csv`.
    pub template_dir: PathBuf,
    /// Sector metadata CSV.
    pub sector_table: PathBuf,
    pub consumption_column: String,
    /// Template column to ignore (e.g. a time-of-day label).
    pub index_column: Option<String>,
    pub categories: CategoryMapping,
}

impl DataSource {
    pub fn new(template_dir: impl Into<PathBuf>, sector_table: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            sector_table: sector_table.into(),
            consumption_column: DEFAULT_CONSUMPTION_COLUMN.to_string(),
            index_column: None,
            categories: CategoryMapping::default(),
        }
    }

    /// Path of the template file for a day type.
    pub fn template_path(&self, day_type: DayType) -> PathBuf {
        self.template_dir
            .join(format!("{}.csv", day_type.table_name()))
    }
}

/// Validated reference data. Immutable after construction and safe to share
/// between concurrent pipeline runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateStore {
    categories: CategoryMapping,
    templates: TemplateSet,
    sectors: SectorTable,
}

impl TemplateStore {
    /// Assembles a store from already parsed parts.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the templates were built for a
    /// different category set.
    pub fn new(
        categories: CategoryMapping,
        templates: TemplateSet,
        sectors: SectorTable,
    ) -> Result<Self> {
        let template_cats = templates.get(DayType::Weekday).table().categories();
        if template_cats != categories.names() {
            return Err(LoadGenError::validation(
                "template categories do not match the category mapping",
            ));
        }
        Ok(Self {
            categories,
            templates,
            sectors,
        })
    }

    /// Reads all reference files described by `source`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for unreadable files and a CSV or validation error
    /// for malformed content.
    pub fn load(source: &DataSource) -> Result<Self> {
        let read = |day_type: DayType| -> Result<DayTypeTemplate> {
            let path = source.template_path(day_type);
            debug!(path = %path.display(), %day_type, "reading template");
            DayTypeTemplate::read_csv(
                open(&path)?,
                day_type,
                &source.categories,
                source.index_column.as_deref(),
                &path.display().to_string(),
            )
        };
        let templates = TemplateSet::new(
            read(DayType::Weekday)?,
            read(DayType::Saturday)?,
            read(DayType::Sunday)?,
            read(DayType::Holiday)?,
        )?;

        debug!(path = %source.sector_table.display(), "reading sector table");
        let sectors = SectorTable::read_csv(
            open(&source.sector_table)?,
            &source.categories,
            &source.consumption_column,
            &source.sector_table.display().to_string(),
        )?;

        info!(
            intervals_per_day = templates.intervals_per_day(),
            industries = sectors.len(),
            "reference data loaded"
        );
        Self::new(source.categories.clone(), templates, sectors)
    }

    pub fn categories(&self) -> &CategoryMapping {
        &self.categories
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn sectors(&self) -> &SectorTable {
        &self.sectors
    }
}

pub(crate) fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadGenError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn template_paths_use_table_names() {
        let src = DataSource::new("data/templates", "data/sectors.csv");
        assert_eq!(
            src.template_path(DayType::Weekday),
            PathBuf::from("data/templates/Week_day.csv")
        );
        assert_eq!(
            src.template_path(DayType::Holiday),
            PathBuf::from("data/templates/Holiday.csv")
        );
    }

    #[test]
    fn missing_directory_is_io_error() {
        let src = DataSource::new("/nonexistent/templates", "/nonexistent/sectors.csv");
        let err = TemplateStore::load(&src).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
