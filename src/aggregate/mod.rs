//! Normalization and aggregation.
//!
//! - raw table -> canonical series (`normalize`)
//! - wide -> long reshaping (`reshape`)
//! - year window / entity / aggregate-name filters (`filter`, `denylist`)
//! - yearly or decade grouping (`group`)

pub mod denylist;
pub mod filter;
pub mod group;
pub mod normalize;
pub mod reshape;

pub use denylist::*;
pub use filter::*;
pub use group::*;
pub use normalize::*;
pub use reshape::*;
