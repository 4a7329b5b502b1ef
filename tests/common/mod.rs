//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use indload_gen::data::{
    CategoryMapping, DayType, DayTypeTemplate, SectorParameters, SectorTable, TemplateSet,
    TemplateStore,
};
use indload_gen::regional::{AllocationTable, ShareRecord, SiteCountRecord};

/// Quarter-hour resolution.
pub const INTERVALS: usize = 96;

/// Relative level of each day type against the weekday template.
pub fn day_level(day_type: DayType) -> f64 {
    match day_type {
        DayType::Weekday => 1.0,
        DayType::Saturday => 0.7,
        DayType::Sunday => 0.4,
        DayType::Holiday => 0.35,
    }
}

/// One template column: a 07:00 to 19:00 production block over a lower
/// night level, offset per category.
pub fn template_column(day_type: DayType, category: usize) -> Vec<f64> {
    (0..INTERVALS)
        .map(|i| {
            let hour = i / 4;
            let shift = if (7..19).contains(&hour) { 1.0 } else { 0.4 };
            day_level(day_type) * shift * (0.5 + 0.05 * category as f64)
        })
        .collect()
}

pub fn template(day_type: DayType, mapping: &CategoryMapping) -> DayTypeTemplate {
    let columns = (0..mapping.len())
        .map(|c| template_column(day_type, c))
        .collect();
    DayTypeTemplate::new(day_type, mapping, columns).expect("valid template")
}

pub fn sector(
    industry_number: u32,
    name: &str,
    fluctuation: u8,
    annual_consumption_mwh: f64,
    peak_factor: f64,
    base_factor: f64,
) -> SectorParameters {
    SectorParameters {
        industry_number,
        name: name.to_string(),
        wz_id: format!("{}", 10 + industry_number),
        shares: vec![0.05, 0.02, 0.30, 0.05, 0.08, 0.05, 0.05, 0.40],
        fluctuation,
        annual_consumption_mwh,
        peak_factor,
        base_factor,
    }
}

/// Industries 3 (plain), 5 (fluctuating, peak/base adjusted) and 8 (light
/// fluctuation).
pub fn sectors() -> Vec<SectorParameters> {
    vec![
        sector(3, "Papiergewerbe", 0, 10_000.0, 0.0, 0.0),
        sector(5, "Chemische Industrie", 20, 25_000.0, 1.4, 0.6),
        sector(8, "Glas und Keramik", 5, 4_000.0, 0.0, 0.0),
    ]
}

/// In-memory reference data with the default category set.
pub fn store() -> TemplateStore {
    let mapping = CategoryMapping::default();
    let templates = TemplateSet::new(
        template(DayType::Weekday, &mapping),
        template(DayType::Saturday, &mapping),
        template(DayType::Sunday, &mapping),
        template(DayType::Holiday, &mapping),
    )
    .expect("valid template set");
    let sectors = SectorTable::new(&mapping, sectors()).expect("valid sector table");
    TemplateStore::new(mapping, templates, sectors).expect("valid store")
}

pub fn site(id: &str, name: &str, wz_name: &str, n_sites: f64, n_cap: f64) -> SiteCountRecord {
    SiteCountRecord {
        id: id.to_string(),
        name: name.to_string(),
        wz2008_abteilung: 0,
        wz2008_abteilung_name: wz_name.to_string(),
        n_sites,
        n_cap,
    }
}

pub fn share(wz_name: &str, agg: &str, agg_id: u32, share: f64) -> ShareRecord {
    ShareRecord {
        sector_wz2008: wz_name.to_string(),
        sector_agg: agg.to_string(),
        sector_agg_id: agg_id,
        share,
    }
}

/// Two regions. Industry 3 is split 0.6/0.4 between them by employees;
/// industry 5 exists only in region "01002", partly through a shared fine
/// category.
pub fn allocation() -> AllocationTable {
    let fine = vec![
        site("01001", "Flensburg", "Papier", 2.0, 60.0),
        site("01002", "Kiel", "Papier", 6.0, 40.0),
        site("01002", "Kiel", "Chemie", 3.0, 90.0),
    ];
    let shares = vec![
        share("Papier", "Papiergewerbe", 3, 1.0),
        share("Chemie", "Chemische Industrie", 5, 0.75),
        share("Chemie", "Glas und Keramik", 8, 0.25),
    ];
    AllocationTable::from_records(&fine, &shares).expect("valid allocation")
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "{a} != {b} (tol {tol})");
}
