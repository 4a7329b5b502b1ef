//! CSV export for annual profiles, day profiles and allocation tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::data::DayType;
use crate::error::{LoadGenError, Result};
use crate::profile::{AnnualLoadProfile, DayProfileSet, TOTAL_COLUMN};
use crate::regional::AllocationTable;

/// Timestamp layout of the `time` column.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ALLOCATION_HEADER: [&str; 6] = [
    "id",
    "name",
    "sector_agg",
    "sector_agg_id",
    "n_sites",
    "n_cap",
];

fn fmt_value(v: f64) -> String {
    format!("{v:.6}")
}

/// Writes an annual profile as `time,<categories...>,Total`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_profile_csv(profile: &AnnualLoadProfile, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["time"];
    header.extend(profile.categories().iter().map(String::as_str));
    header.push(TOTAL_COLUMN);
    wtr.write_record(&header)?;

    let table = profile.table();
    for (i, ts) in profile.index().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(ts.format(TIME_FORMAT).to_string());
        record.extend(table.row(i).map(fmt_value));
        record.push(fmt_value(table.total()[i]));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the four day-type profiles as
/// `day_type,interval,<categories...>,Total`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_day_profiles_csv(profiles: &DayProfileSet, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["day_type", "interval"];
    header.extend(profiles.weekday.categories().iter().map(String::as_str));
    header.push(TOTAL_COLUMN);
    wtr.write_record(&header)?;

    for day_type in DayType::ALL {
        let day = profiles.get(day_type);
        for i in 0..day.len() {
            let mut record = Vec::with_capacity(header.len());
            record.push(day_type.to_string());
            record.push(i.to_string());
            record.extend(day.row(i).map(fmt_value));
            record.push(fmt_value(day.total()[i]));
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the allocation table as
/// `id,name,sector_agg,sector_agg_id,n_sites,n_cap`.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_allocation_csv(table: &AllocationTable, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(ALLOCATION_HEADER)?;
    for row in table.rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn export_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(io::BufWriter<File>) -> io::Result<()>,
{
    let io_err = |source| LoadGenError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    write(io::BufWriter::new(file)).map_err(io_err)
}

/// Exports an annual profile to a CSV file.
///
/// # Errors
///
/// Returns [`LoadGenError::Io`] if file creation or writing fails.
pub fn export_profile_csv(profile: &AnnualLoadProfile, path: &Path) -> Result<()> {
    export_with(path, |w| write_profile_csv(profile, w))
}

/// Exports day profiles to a CSV file.
///
/// # Errors
///
/// Returns [`LoadGenError::Io`] if file creation or writing fails.
pub fn export_day_profiles_csv(profiles: &DayProfileSet, path: &Path) -> Result<()> {
    export_with(path, |w| write_day_profiles_csv(profiles, w))
}

/// Exports the allocation table to a CSV file.
///
/// # Errors
///
/// Returns [`LoadGenError::Io`] if file creation or writing fails.
pub fn export_allocation_csv(table: &AllocationTable, path: &Path) -> Result<()> {
    export_with(path, |w| write_allocation_csv(table, w))
}
