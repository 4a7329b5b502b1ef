//! Reference data: end-use categories, day-type templates and sector metadata.

/// End-use category set and template header normalization.
pub mod categories;
pub mod sector;
pub mod store;
/// Day types and their intraday shape templates.
pub mod templates;

pub use categories::CategoryMapping;
pub use sector::{SectorOverrides, SectorParameters, SectorTable};
pub use store::{DataSource, TemplateStore};
pub use templates::{DayType, DayTypeTemplate, TemplateSet};
