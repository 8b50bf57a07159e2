//! `climate-trends` library crate.
//!
//! The binary (`ct`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - every dataset goes through the same resolve / aggregate / fit / project code
//! - presets stay data, not code

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod datasets;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod project;
pub mod report;
pub mod resolve;
