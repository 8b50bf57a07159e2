//! Input/output helpers.
//!
//! - CSV ingest into raw tables (`ingest`)
//! - JSON document-collection exports (`documents`)
//! - series / projection exports (CSV/JSON) (`export`)

pub mod documents;
pub mod export;
pub mod ingest;

pub use documents::*;
pub use export::*;
pub use ingest::*;
