//! Error taxonomy shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`LoadGenError`], for callers that only need
/// to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    AllocationAbsent,
    Io,
}

/// Errors raised by the load generator.
#[derive(Error, Debug)]
pub enum LoadGenError {
    /// The requested industry number has no row in the sector table.
    #[error("industry number {0} not found in sector table")]
    IndustryNotFound(u32),

    /// The requested region id does not occur in the allocation table.
    #[error("region \"{0}\" not found in allocation table")]
    RegionNotFound(String),

    /// Malformed input data or parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// The region has no allocation for the industry type.
    #[error("no allocation for industry type {industry_type} in region \"{region_id}\"")]
    AllocationAbsent {
        industry_type: u32,
        region_id: String,
    },

    #[error("I/O error on \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in \"{}\": {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LoadGenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IndustryNotFound(_) | Self::RegionNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::AllocationAbsent { .. } => ErrorKind::AllocationAbsent,
            Self::Io { .. } | Self::Csv { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, LoadGenError>;
