//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - decoded axes and observation keys (`DimensionAxis`, `ObservationKey`)
//! - long-form and wide-form records (`ResolvedRecord`, `WideTable`)
//! - view selections and run configuration (`ViewSpec`, `ExtractConfig`)

pub mod types;

pub use types::*;
