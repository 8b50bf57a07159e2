//! Per-entity trend fits (one line per country or energy source).

use std::collections::HashMap;

use rayon::prelude::*;

use crate::domain::{Observation, TrendModel};
use crate::error::TrendError;
use crate::fit::linear::fit_linear;

/// Linear fit result for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTrend {
    pub entity: String,
    pub result: Result<TrendModel, TrendError>,
}

/// Fit every entity independently.
///
/// Entities are returned in first-appearance order; records without an entity
/// are ignored. Entities with too few points keep their `InsufficientData` error.
pub fn fit_per_entity<O: Observation + Sync>(records: &[O]) -> Vec<EntityTrend> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&O>)> = Vec::new();
    for r in records {
        let Some(name) = r.entity() else { continue };
        let slot = *index.entry(name).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(r);
    }

    groups
        .par_iter()
        .map(|(name, rows)| EntityTrend {
            entity: name.to_string(),
            result: fit_linear(rows),
        })
        .collect()
}

/// The entity with the largest signed slope (first appearance wins ties).
pub fn steepest_entity(trends: &[EntityTrend]) -> Option<(&str, &TrendModel)> {
    trends
        .iter()
        .filter_map(|t| t.result.as_ref().ok().map(|m| (t.entity.as_str(), m)))
        .fold(None, |best: Option<(&str, &TrendModel)>, cur| match best {
            Some(b) if b.1.slope >= cur.1.slope => Some(b),
            _ => Some(cur),
        })
}
