//! Output writers.

pub mod export;

pub use export::{
    export_allocation_csv, export_day_profiles_csv, export_profile_csv, write_allocation_csv,
    write_day_profiles_csv, write_profile_csv,
};
