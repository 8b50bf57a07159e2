//! Aggregate-name filter.
//!
//! World Bank / Our World in Data style files mix countries with regional and
//! income-group rows. Those rows are recognised by name fragment, matched
//! case-insensitively as substrings of the trimmed entity name.

use serde::{Deserialize, Serialize};

/// Fixed policy list of aggregate-name fragments.
pub const AGGREGATE_NAME_FRAGMENTS: [&str; 22] = [
    "world",
    "income",
    "ibrd",
    "ida",
    "oecd",
    "european union",
    "euro area",
    "east asia",
    "south asia",
    "north america",
    "latin america",
    "caribbean",
    "central asia",
    "middle east",
    "north africa",
    "sub-saharan",
    "small states",
    "pacific island",
    "post-demographic",
    "pre-demographic",
    "early-demographic",
    "late-demographic",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDenylist {
    fragments: Vec<String>,
}

impl Default for EntityDenylist {
    fn default() -> Self {
        Self::with_fragments(&AGGREGATE_NAME_FRAGMENTS)
    }
}

impl EntityDenylist {
    pub fn with_fragments(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.trim().to_lowercase()).collect(),
        }
    }

    /// `true` when the name is blank or contains any denylisted fragment.
    pub fn is_aggregate(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return true;
        }
        let lower = name.to_lowercase();
        self.fragments.iter().any(|f| lower.contains(f.as_str()))
    }
}
