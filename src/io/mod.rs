//! Input/output helpers.
//!
//! - table sinks (CSV / in-memory) (`export`)
//! - saved SDMX-JSON messages (`payload`)

pub mod export;
pub mod payload;

pub use export::*;
pub use payload::*;
