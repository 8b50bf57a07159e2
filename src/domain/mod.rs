//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw input tables (`RawTable`, `Scalar`)
//! - normalized and aggregated series (`CanonicalSeries`, `AggregatedSeries`)
//! - fit and projection outputs (`TrendModel`, `QuadraticModel`, `Projection`)
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
