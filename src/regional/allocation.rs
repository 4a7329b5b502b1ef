//! Reclassification of regional site and employee counts into industry
//! types, and the per-region scaling factors derived from them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoadGenError, Result};

/// Site and employee counts of one region for one fine sector category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteCountRecord {
    /// Region id (kept as text to preserve leading zeros).
    pub id: String,
    pub name: String,
    pub wz2008_abteilung: u32,
    pub wz2008_abteilung_name: String,
    pub n_sites: f64,
    pub n_cap: f64,
}

/// Fraction of a fine category attributed to one industry type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShareRecord {
    pub sector_wz2008: String,
    pub sector_agg: String,
    pub sector_agg_id: u32,
    pub share: f64,
}

/// Counts of one region for one industry type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalAllocation {
    #[serde(rename = "id")]
    pub region_id: String,
    #[serde(rename = "name")]
    pub region_name: String,
    #[serde(rename = "sector_agg")]
    pub industry_type: String,
    /// Matches the industry number of the sector table.
    #[serde(rename = "sector_agg_id")]
    pub industry_type_id: u32,
    pub n_sites: f64,
    pub n_cap: f64,
}

/// Quantity used to split a national profile between regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SplitBasis {
    /// Number of employees.
    #[default]
    #[serde(rename = "n_cap")]
    Employees,
    /// Number of production sites.
    #[serde(rename = "n_sites")]
    Sites,
}

impl SplitBasis {
    fn quantity(self, row: &RegionalAllocation) -> f64 {
        match self {
            SplitBasis::Employees => row.n_cap,
            SplitBasis::Sites => row.n_sites,
        }
    }
}

impl fmt::Display for SplitBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitBasis::Employees => f.write_str("n_cap"),
            SplitBasis::Sites => f.write_str("n_sites"),
        }
    }
}

impl FromStr for SplitBasis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "n_cap" => Ok(SplitBasis::Employees),
            "n_sites" => Ok(SplitBasis::Sites),
            other => Err(format!("split basis must be \"n_cap\" or \"n_sites\", got \"{other}\"")),
        }
    }
}

/// Redistributes fine-category counts onto industry types.
///
/// Every fine row is joined with all share rows of its category; each count
/// is multiplied by the share and summed per
/// (region id, region name, industry type, industry type id).
///
/// # Errors
///
/// Returns a validation error if a fine category has no share entry, or if a
/// count or share is negative or not finite.
pub fn reclassify(
    fine: &[SiteCountRecord],
    shares: &[ShareRecord],
) -> Result<Vec<RegionalAllocation>> {
    let mut weights: HashMap<&str, Vec<&ShareRecord>> = HashMap::new();
    for s in shares {
        if !s.share.is_finite() || s.share < 0.0 {
            return Err(LoadGenError::validation(format!(
                "share {} for \"{}\" -> \"{}\" must be a non-negative number",
                s.share, s.sector_wz2008, s.sector_agg
            )));
        }
        weights.entry(s.sector_wz2008.as_str()).or_default().push(s);
    }

    let mut grouped: BTreeMap<(&str, &str, &str, u32), (f64, f64)> = BTreeMap::new();
    for row in fine {
        let invalid = |v: f64| !v.is_finite() || v < 0.0;
        if invalid(row.n_sites) || invalid(row.n_cap) {
            return Err(LoadGenError::validation(format!(
                "region {} category \"{}\": counts must be non-negative numbers",
                row.id, row.wz2008_abteilung_name
            )));
        }
        let entries = weights
            .get(row.wz2008_abteilung_name.as_str())
            .ok_or_else(|| {
                LoadGenError::validation(format!(
                    "no share entry for fine category \"{}\"",
                    row.wz2008_abteilung_name
                ))
            })?;
        for w in entries {
            let acc = grouped
                .entry((
                    row.id.as_str(),
                    row.name.as_str(),
                    w.sector_agg.as_str(),
                    w.sector_agg_id,
                ))
                .or_insert((0.0, 0.0));
            acc.0 += row.n_sites * w.share;
            acc.1 += row.n_cap * w.share;
        }
    }

    Ok(grouped
        .into_iter()
        .map(|((id, name, agg, agg_id), (n_sites, n_cap))| RegionalAllocation {
            region_id: id.to_string(),
            region_name: name.to_string(),
            industry_type: agg.to_string(),
            industry_type_id: agg_id,
            n_sites,
            n_cap,
        })
        .collect())
}

/// Regional counts per industry type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationTable {
    rows: Vec<RegionalAllocation>,
}

impl AllocationTable {
    pub fn new(rows: Vec<RegionalAllocation>) -> Self {
        Self { rows }
    }

    /// Reclassifies fine records into a table.
    ///
    /// # Errors
    ///
    /// See [`reclassify`].
    pub fn from_records(fine: &[SiteCountRecord], shares: &[ShareRecord]) -> Result<Self> {
        let rows = reclassify(fine, shares)?;
        debug!(
            fine_rows = fine.len(),
            rows = rows.len(),
            "regional counts reclassified"
        );
        Ok(Self::new(rows))
    }

    /// Reads both tables from CSV and reclassifies them.
    ///
    /// # Errors
    ///
    /// Returns a CSV error on malformed input and see [`reclassify`].
    pub fn read_csv<R1: Read, R2: Read>(
        site_counts: R1,
        site_source: &str,
        shares: R2,
        share_source: &str,
    ) -> Result<Self> {
        let fine: Vec<SiteCountRecord> = read_records(site_counts, site_source)?;
        let weights: Vec<ShareRecord> = read_records(shares, share_source)?;
        Self::from_records(&fine, &weights)
    }

    pub fn rows(&self) -> &[RegionalAllocation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one industry type across all regions.
    pub fn for_industry_type(
        &self,
        industry_type: u32,
    ) -> impl Iterator<Item = &RegionalAllocation> {
        self.rows
            .iter()
            .filter(move |r| r.industry_type_id == industry_type)
    }

    /// Rows of one region across all industry types.
    pub fn for_region<'a>(
        &'a self,
        region_id: &'a str,
    ) -> impl Iterator<Item = &'a RegionalAllocation> {
        self.rows.iter().filter(move |r| r.region_id == region_id)
    }

    pub fn contains_region(&self, region_id: &str) -> bool {
        self.rows.iter().any(|r| r.region_id == region_id)
    }

    /// Industry type ids with their names.
    pub fn industry_types(&self) -> BTreeMap<u32, &str> {
        self.rows
            .iter()
            .map(|r| (r.industry_type_id, r.industry_type.as_str()))
            .collect()
    }

    /// Sum of the basis quantity of one industry type over all regions.
    pub fn national_total(&self, industry_type: u32, basis: SplitBasis) -> f64 {
        self.for_industry_type(industry_type)
            .map(|r| basis.quantity(r))
            .sum()
    }

    /// Share of the national quantity of `industry_type` located in
    /// `region_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadGenError::RegionNotFound`] if the region does not occur
    /// at all, and [`LoadGenError::AllocationAbsent`] if its quantity for the
    /// industry type is zero (including no row) or the national total is zero.
    pub fn scaling_factor(
        &self,
        industry_type: u32,
        region_id: &str,
        basis: SplitBasis,
    ) -> Result<f64> {
        if !self.contains_region(region_id) {
            return Err(LoadGenError::RegionNotFound(region_id.to_string()));
        }
        let absent = || LoadGenError::AllocationAbsent {
            industry_type,
            region_id: region_id.to_string(),
        };
        let region_qty: f64 = self
            .for_region(region_id)
            .filter(|r| r.industry_type_id == industry_type)
            .map(|r| basis.quantity(r))
            .sum();
        // No row and a zero-count row are the same: nothing allocated here.
        if region_qty <= 0.0 {
            return Err(absent());
        }
        let national = self.national_total(industry_type, basis);
        if national <= 0.0 {
            return Err(absent());
        }
        Ok(region_qty / national)
    }
}

fn read_records<T, R>(reader: R, source: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| LoadGenError::Csv {
            path: source.into(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fine(id: &str, name: &str, wz: &str, n_sites: f64, n_cap: f64) -> SiteCountRecord {
        SiteCountRecord {
            id: id.into(),
            name: name.into(),
            wz2008_abteilung: 0,
            wz2008_abteilung_name: wz.into(),
            n_sites,
            n_cap,
        }
    }

    fn share(wz: &str, agg: &str, agg_id: u32, share: f64) -> ShareRecord {
        ShareRecord {
            sector_wz2008: wz.into(),
            sector_agg: agg.into(),
            sector_agg_id: agg_id,
            share,
        }
    }

    #[test]
    fn fine_category_split_across_types() {
        let rows = reclassify(
            &[fine("01", "Nord", "Chemie", 10.0, 100.0)],
            &[
                share("Chemie", "Grundstoff", 1, 0.25),
                share("Chemie", "Pharma", 2, 0.75),
            ],
        )
        .expect("reclassified");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].industry_type_id, 1);
        assert_eq!(rows[0].n_cap, 25.0);
        assert_eq!(rows[1].n_sites, 7.5);
    }

    #[test]
    fn fine_categories_add_into_one_type() {
        let counts = [
            fine("01", "Nord", "Glas", 10.0, 100.0),
            fine("01", "Nord", "Keramik", 20.0, 50.0),
            fine("02", "Sued", "Glas", 5.0, 40.0),
            fine("02", "Sued", "Keramik", 1.0, 30.0),
        ];
        let weights = [
            share("Glas", "Glas und Keramik", 5, 0.6),
            share("Keramik", "Glas und Keramik", 5, 0.4),
        ];
        let rows = reclassify(&counts, &weights).expect("reclassified");
        assert_eq!(rows.len(), 2);

        let expected = [("01", 14.0, 80.0), ("02", 3.4, 36.0)];
        for (row, (id, n_sites, n_cap)) in rows.iter().zip(expected) {
            assert_eq!(row.region_id, id);
            assert_eq!(row.industry_type_id, 5);
            assert!((row.n_sites - n_sites).abs() < 1e-12);
            assert!((row.n_cap - n_cap).abs() < 1e-12);
        }

        let table = AllocationTable::new(rows);
        let weighted = |f: fn(&SiteCountRecord) -> f64| -> f64 {
            counts
                .iter()
                .map(|c| {
                    let w = weights
                        .iter()
                        .find(|s| s.sector_wz2008 == c.wz2008_abteilung_name)
                        .map_or(0.0, |s| s.share);
                    f(c) * w
                })
                .sum()
        };
        let sites = table.national_total(5, SplitBasis::Sites);
        let cap = table.national_total(5, SplitBasis::Employees);
        assert!((sites - weighted(|c| c.n_sites)).abs() < 1e-12);
        assert!((cap - weighted(|c| c.n_cap)).abs() < 1e-12);
    }

    #[test]
    fn zero_count_row_is_absent() {
        let t = AllocationTable::from_records(
            &[
                fine("01001", "Flensburg", "Papier", 0.0, 0.0),
                fine("01002", "Kiel", "Papier", 6.0, 40.0),
            ],
            &[share("Papier", "Papier", 3, 1.0)],
        )
        .expect("table");
        assert_eq!(t.for_region("01001").count(), 1);
        for basis in [SplitBasis::Employees, SplitBasis::Sites] {
            let err = t
                .scaling_factor(3, "01001", basis)
                .expect_err("zero allocation");
            assert_eq!(err.kind(), crate::error::ErrorKind::AllocationAbsent);
            assert_eq!(t.scaling_factor(3, "01002", basis).ok(), Some(1.0));
        }
    }

    #[test]
    fn missing_share_entry_is_validation_error() {
        let err = reclassify(&[fine("01", "Nord", "Glas", 1.0, 1.0)], &[])
            .expect_err("must fail");
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(err.to_string().contains("Glas"));
    }

    #[test]
    fn negative_share_rejected() {
        let err = reclassify(
            &[fine("01", "Nord", "Glas", 1.0, 1.0)],
            &[share("Glas", "Glas", 4, -0.1)],
        );
        assert!(err.is_err());
    }

    #[test]
    fn reads_csv_with_leading_zero_ids() {
        let sites = "id,name,wz2008_abteilung,wz2008_abteilung_name,n_sites,n_cap\n\
                     01001,Flensburg,17,Papier,4,120\n";
        let shares = "sector_wz2008,sector_agg,sector_agg_id,share\nPapier,Papier,3,1.0\n";
        let t = AllocationTable::read_csv(sites.as_bytes(), "s.csv", shares.as_bytes(), "w.csv")
            .expect("table parses");
        assert_eq!(t.len(), 1);
        assert_eq!(t.rows()[0].region_id, "01001");
        assert_eq!(t.rows()[0].n_cap, 120.0);
    }

    #[test]
    fn factor_is_region_share() {
        let t = AllocationTable::from_records(
            &[
                fine("A", "A", "Papier", 1.0, 30.0),
                fine("B", "B", "Papier", 3.0, 10.0),
            ],
            &[share("Papier", "Papier", 3, 1.0)],
        )
        .expect("table");
        let by_cap = t.scaling_factor(3, "A", SplitBasis::Employees);
        assert_eq!(by_cap.ok(), Some(0.75));
        let by_sites = t.scaling_factor(3, "A", SplitBasis::Sites);
        assert_eq!(by_sites.ok(), Some(0.25));
    }

    #[test]
    fn split_basis_parses() {
        assert_eq!("n_cap".parse::<SplitBasis>(), Ok(SplitBasis::Employees));
        assert_eq!("n_sites".parse::<SplitBasis>(), Ok(SplitBasis::Sites));
        assert!("cap".parse::<SplitBasis>().is_err());
    }
}
