//! Time-bucket aggregation.
//!
//! Observations are grouped by `(entity, key(time))`. Each group keeps a running
//! weighted sum, so aggregating an already-aggregated series (weight = count)
//! returns it unchanged and decade means of yearly means equal decade means of
//! the raw rows.

use std::collections::HashMap;

use crate::aggregate::denylist::EntityDenylist;
use crate::domain::{AggregatedRecord, AggregatedSeries, Observation, Reduction, TimeKey};

#[derive(Debug, Clone)]
struct Bucket {
    entity: Option<String>,
    time: i32,
    /// Σ value·weight for means, Σ value for sums.
    acc: f64,
    count: usize,
    /// Sole contributing value, kept so single-record groups reproduce it bit for bit.
    single: Option<f64>,
}

/// Group-by configuration.
#[derive(Debug, Clone)]
pub struct Aggregator {
    pub key: TimeKey,
    pub reduction: Reduction,
    /// When set, entities matching the denylist are excluded before grouping.
    pub denylist: Option<EntityDenylist>,
}

impl Aggregator {
    pub fn new(key: TimeKey) -> Self {
        Self {
            key,
            reduction: Reduction::Mean,
            denylist: None,
        }
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_denylist(mut self, denylist: EntityDenylist) -> Self {
        self.denylist = Some(denylist);
        self
    }

    /// Aggregate observations; output order is the first appearance of each group.
    pub fn aggregate<O: Observation>(&self, records: &[O]) -> AggregatedSeries {
        let mut index: HashMap<(Option<String>, i32), usize> = HashMap::new();
        let mut buckets: Vec<Bucket> = Vec::new();
        let mut excluded = 0usize;

        for r in records {
            if let (Some(deny), Some(name)) = (&self.denylist, r.entity()) {
                if deny.is_aggregate(name) {
                    excluded += 1;
                    continue;
                }
            }
            let weight = r.weight();
            if weight == 0 || !r.value().is_finite() {
                continue;
            }

            let key = (r.entity().map(str::to_string), self.key.key(r.time()));
            let slot = *index.entry(key).or_insert_with_key(|(entity, time)| {
                buckets.push(Bucket {
                    entity: entity.clone(),
                    time: *time,
                    acc: 0.0,
                    count: 0,
                    single: None,
                });
                buckets.len() - 1
            });

            let bucket = &mut buckets[slot];
            bucket.single = if bucket.count == 0 { Some(r.value()) } else { None };
            bucket.acc += match self.reduction {
                Reduction::Mean => r.value() * weight as f64,
                Reduction::Sum => r.value(),
            };
            bucket.count += weight;
        }

        if excluded > 0 {
            tracing::debug!(excluded, "dropped aggregate-entity rows before grouping");
        }

        let records = buckets
            .into_iter()
            .map(|b| {
                let value = match (b.single, self.reduction) {
                    (Some(v), _) => v,
                    (None, Reduction::Mean) => b.acc / b.count as f64,
                    (None, Reduction::Sum) => b.acc,
                };
                AggregatedRecord {
                    entity: b.entity,
                    time: b.time,
                    value,
                    count: b.count,
                }
            })
            .collect();

        AggregatedSeries {
            key: self.key,
            reduction: self.reduction,
            records,
        }
    }
}

/// Mean per `key(time)` (and per entity), no denylist.
pub fn aggregate<O: Observation>(records: &[O], key: TimeKey) -> AggregatedSeries {
    Aggregator::new(key).aggregate(records)
}

/// The groups holding the largest and smallest value (first appearance wins ties).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesExtremes {
    pub max: AggregatedRecord,
    pub min: AggregatedRecord,
}

pub fn series_extremes(series: &AggregatedSeries) -> Option<SeriesExtremes> {
    let mut iter = series.records.iter();
    let first = iter.next()?;
    let (mut max, mut min) = (first, first);
    for r in iter {
        if r.value > max.value {
            max = r;
        }
        if r.value < min.value {
            min = r;
        }
    }
    Some(SeriesExtremes {
        max: max.clone(),
        min: min.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalRecord, CanonicalSeries};

    #[test]
    fn decade_means_follow_first_appearance() {
        let series = CanonicalSeries::global(&[(1995, 1.0), (1999, 3.0), (2001, 10.0), (1990, 2.0)]);
        let out = aggregate(series.records(), TimeKey::Decade);
        assert_eq!(out.len(), 2);
        assert_eq!(out.records[0].time, 1990);
        assert!((out.records[0].value - 2.0).abs() < 1e-12);
        assert_eq!(out.records[0].count, 3);
        assert_eq!(out.records[1].time, 2000);
        assert_eq!(out.records[1].count, 1);
    }

    #[test]
    fn entities_are_grouped_separately() {
        let records = vec![
            CanonicalRecord::new(Some("Spain"), 2010, 300.0),
            CanonicalRecord::new(Some("France"), 2010, 320.0),
            CanonicalRecord::new(Some("Spain"), 2010, 310.0),
        ];
        let out = aggregate(&records, TimeKey::Year);
        assert_eq!(out.len(), 2);
        assert_eq!(out.records[0].entity.as_deref(), Some("Spain"));
        assert!((out.records[0].value - 305.0).abs() < 1e-12);
    }

    #[test]
    fn denylist_excludes_aggregate_entities() {
        let records = vec![
            CanonicalRecord::new(Some("Spain"), 2010, 300.0),
            CanonicalRecord::new(Some("World"), 2010, 9000.0),
            CanonicalRecord::new(Some("High income"), 2010, 5000.0),
            CanonicalRecord::new(Some("France"), 2010, 320.0),
        ];
        let out = Aggregator::new(TimeKey::Year)
            .with_denylist(EntityDenylist::default())
            .aggregate(&records);
        let names: Vec<_> = out.records.iter().filter_map(|r| r.entity.as_deref()).collect();
        assert_eq!(names, vec!["Spain", "France"]);
    }

    #[test]
    fn reaggregating_is_a_fixed_point() {
        let series = CanonicalSeries::global(&[(1991, 0.1), (1992, 0.7), (2003, 0.3), (2004, 0.35), (2011, 0.9)]);
        let once = aggregate(series.records(), TimeKey::Decade);
        let twice = aggregate(once.records(), TimeKey::Decade);
        assert_eq!(once, twice);
    }

    #[test]
    fn yearly_then_decade_equals_decade_of_raw_rows() {
        let series = CanonicalSeries::global(&[(1990, 1.0), (1990, 3.0), (1991, 5.0)]);
        let yearly = aggregate(series.records(), TimeKey::Year);
        let via_yearly = aggregate(yearly.records(), TimeKey::Decade);
        let direct = aggregate(series.records(), TimeKey::Decade);
        assert!((via_yearly.records[0].value - direct.records[0].value).abs() < 1e-12);
        assert_eq!(via_yearly.records[0].count, 3);
    }

    #[test]
    fn sum_reduction_adds_values() {
        let records = vec![
            CanonicalRecord::new(Some("coal"), 2000, 10.0),
            CanonicalRecord::new(Some("coal"), 2000, 5.0),
        ];
        let out = Aggregator::new(TimeKey::Year)
            .with_reduction(Reduction::Sum)
            .aggregate(&records);
        assert!((out.records[0].value - 15.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let out = aggregate::<CanonicalRecord>(&[], TimeKey::Year);
        assert!(out.is_empty());
        assert!(series_extremes(&out).is_none());
    }

    #[test]
    fn extremes_pick_max_and_min_groups() {
        let series = CanonicalSeries::global(&[(1980, 7.0), (1990, 6.5), (2000, 6.0), (2010, 6.2)]);
        let out = aggregate(series.records(), TimeKey::Decade);
        let ext = series_extremes(&out).unwrap();
        assert_eq!(ext.max.time, 1980);
        assert_eq!(ext.min.time, 2000);
    }
}
