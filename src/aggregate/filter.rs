//! Row filters over canonical series: year window, entity selection, and
//! aggregate exclusion.

use crate::aggregate::denylist::EntityDenylist;
use crate::domain::{CanonicalSeries, YearRange};
use crate::error::TrendError;

/// Keep records whose year falls inside `range` (inclusive).
pub fn within_years(series: &CanonicalSeries, range: YearRange) -> Result<CanonicalSeries, TrendError> {
    if range.from > range.to {
        return Err(TrendError::InvalidRange {
            from: range.from,
            to: range.to,
        });
    }
    Ok(CanonicalSeries::new(
        series
            .records
            .iter()
            .filter(|r| range.contains(r.time))
            .cloned()
            .collect(),
    ))
}

/// Keep records of the named entities (case-insensitive). An empty selection keeps everything.
pub fn select_entities(series: &CanonicalSeries, names: &[String]) -> CanonicalSeries {
    if names.is_empty() {
        return series.clone();
    }
    CanonicalSeries::new(
        series
            .records
            .iter()
            .filter(|r| {
                r.entity.as_deref().is_some_and(|e| {
                    let e = e.trim().to_lowercase();
                    names.iter().any(|n| n.trim().to_lowercase() == e)
                })
            })
            .cloned()
            .collect(),
    )
}

/// Drop records whose entity is an aggregate; also returns the distinct names dropped.
pub fn exclude_aggregates(series: &CanonicalSeries, denylist: &EntityDenylist) -> (CanonicalSeries, Vec<String>) {
    let mut excluded: Vec<String> = Vec::new();
    let mut kept = Vec::with_capacity(series.len());
    for r in &series.records {
        match r.entity.as_deref() {
            Some(name) if denylist.is_aggregate(name) => {
                if !excluded.iter().any(|e| e == name) {
                    excluded.push(name.to_string());
                }
            }
            _ => kept.push(r.clone()),
        }
    }
    (CanonicalSeries::new(kept), excluded)
}
