//! Reporting: trend classification, summary sentences, and run conclusions.
//!
//! We keep formatting code in one place so the fitting code stays free of
//! wording decisions.

pub mod format;
pub mod summary;

pub use format::*;
pub use summary::*;
