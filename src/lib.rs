//! Synthetic industrial electricity load profiles.
//!
//! An industry type's annual profile is built in four stages: share-weighted
//! day profiles from day-type templates, peak/base adjustment, assembly over a
//! holiday-aware calendar with normalization to a reference consumption, and
//! scaling to the sector's consumption with seeded fluctuation. National
//! profiles can then be split between regions by site or employee counts.

pub mod cache;
pub mod config;
/// Reference data: categories, templates and sector metadata.
pub mod data;
pub mod error;
pub mod io;
/// Profile synthesis stages.
pub mod pipeline;
pub mod profile;
pub mod regional;

pub use error::{ErrorKind, LoadGenError, Result};
pub use pipeline::{PipelineOutput, PipelineRequest, run_pipeline};
pub use profile::{AnnualLoadProfile, DayProfile, DayProfileSet, LoadTable};
