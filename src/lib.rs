//! `econ-indices` library crate.
//!
//! Turns OECD SDMX-JSON responses into wide, period-by-series tables:
//!
//! - `sdmx`: payload model, axis decoding, observation key parsing
//! - `transform`: record resolution, pivoting, view extraction
//! - `data` / `io`: where messages come from and where tables go
//!
//! The binary (`indices`) is a thin wrapper around this library so that the
//! core logic is testable without spawning processes or touching the network.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod sdmx;
pub mod transform;
