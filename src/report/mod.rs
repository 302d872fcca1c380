//! Terminal reporting: run summaries, table previews and axis listings.

pub mod format;

pub use format::*;
