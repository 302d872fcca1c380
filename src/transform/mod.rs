//! Reshaping stages: resolve -> pivot -> views.
//!
//! All functions are pure: each takes the previous stage's output by reference
//! and returns a freshly built value.

pub mod pivot;
pub mod resolve;
pub mod view;

pub use pivot::pivot;
pub use resolve::resolve;
pub use view::{extract_view, extract_views};
