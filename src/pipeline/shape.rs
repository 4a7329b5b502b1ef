//! Stage 1: weight the day-type templates with an industry's end-use shares.

use tracing::debug;

use crate::data::{DayType, DayTypeTemplate, SectorParameters, TemplateStore};
use crate::error::{LoadGenError, Result};
use crate::profile::{DayProfile, DayProfileSet, LoadTable};

/// Share-weighted day profiles together with the selected sector row.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeOutput {
    pub profiles: DayProfileSet,
    pub parameters: SectorParameters,
}

/// Builds the five share-weighted day profiles for an industry type.
///
/// Each template column is multiplied by the industry's share for that
/// category; `Total` is the row-wise sum.
///
/// # Errors
///
/// Returns [`LoadGenError::IndustryNotFound`] if the industry number is not
/// in the sector table.
pub fn synthesize_shapes(store: &TemplateStore, industry_number: u32) -> Result<ShapeOutput> {
    let parameters = store.sectors().get(industry_number)?.clone();
    let templates = store.templates();
    let weekday_template = templates.get(DayType::Weekday);

    let profiles = DayProfileSet {
        weekday: weight_template(weekday_template, &parameters.shares)?,
        saturday: weight_template(templates.get(DayType::Saturday), &parameters.shares)?,
        sunday: weight_template(templates.get(DayType::Sunday), &parameters.shares)?,
        holiday: weight_template(templates.get(DayType::Holiday), &parameters.shares)?,
        constant: weight_template(&weekday_template.constant_like(), &parameters.shares)?,
    };
    debug!(
        industry_number,
        name = %parameters.name,
        intervals = profiles.intervals_per_day(),
        "shapes synthesized"
    );
    Ok(ShapeOutput {
        profiles,
        parameters,
    })
}

/// Scales each template column by the matching share.
///
/// # Errors
///
/// Returns a validation error if the share vector length does not match the
/// template's category count.
pub fn weight_template(template: &DayTypeTemplate, shares: &[f64]) -> Result<DayProfile> {
    let table = template.table();
    if shares.len() != table.categories().len() {
        return Err(LoadGenError::validation(format!(
            "{} shares for {} template categories",
            shares.len(),
            table.categories().len()
        )));
    }
    let columns = table
        .columns()
        .iter()
        .zip(shares)
        .map(|(col, share)| col.iter().map(|v| v * share).collect())
        .collect();
    LoadTable::from_columns(table.categories().to_vec(), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CategoryMapping;

    fn mapping() -> CategoryMapping {
        CategoryMapping::new(
            vec!["IKT".into(), "Beleuchtung".into()],
            Default::default(),
            Default::default(),
        )
        .expect("valid mapping")
    }

    #[test]
    fn columns_scaled_by_share() {
        let t = DayTypeTemplate::new(
            DayType::Weekday,
            &mapping(),
            vec![vec![0.5, 1.0], vec![0.2, 0.4]],
        )
        .expect("valid template");
        let p = weight_template(&t, &[2.0, 0.5]).expect("weights apply");
        assert_eq!(p.column("IKT"), Some(&[1.0, 2.0][..]));
        assert_eq!(p.column("Beleuchtung"), Some(&[0.1, 0.2][..]));
        assert_eq!(p.total(), &[1.1, 2.2]);
    }

    #[test]
    fn share_length_mismatch_rejected() {
        let t = DayTypeTemplate::new(DayType::Weekday, &mapping(), vec![vec![0.5], vec![0.2]])
            .expect("valid template");
        assert!(weight_template(&t, &[1.0]).is_err());
    }
}
