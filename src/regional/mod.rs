//! Regional disaggregation of national industry profiles.

pub mod allocation;
pub mod disaggregate;

use std::path::Path;

use tracing::info;

use crate::data::store::open;
use crate::error::Result;

pub use allocation::{
    AllocationTable, RegionalAllocation, ShareRecord, SiteCountRecord, SplitBasis, reclassify,
};
pub use disaggregate::{
    AbsentPolicy, Contribution, RegionProfile, disaggregate, region_profile, resolve_factor,
    scale_to_region,
};

/// Reads the site-count and share tables from disk and reclassifies them.
///
/// # Errors
///
/// Returns an I/O error for unreadable files, and a CSV or validation error
/// for malformed content.
pub fn load_allocation(site_counts: &Path, shares: &Path) -> Result<AllocationTable> {
    let table = AllocationTable::read_csv(
        open(site_counts)?,
        &site_counts.display().to_string(),
        open(shares)?,
        &shares.display().to_string(),
    )?;
    info!(
        rows = table.len(),
        industry_types = table.industry_types().len(),
        "allocation table loaded"
    );
    Ok(table)
}
