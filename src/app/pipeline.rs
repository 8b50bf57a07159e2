//! The shared analysis pipeline.
//!
//! raw table -> prepare -> resolve -> normalize -> filter -> aggregate -> fit -> project -> conclude
//!
//! Every dataset goes through this one function; presets only change the data
//! it is called with. Fits that cannot run (too few points) are kept as errors in
//! the output so the report can say what was skipped.

use crate::aggregate::{
    Aggregator, EntityDenylist, NormalizeReport, exclude_aggregates, normalize, select_entities, series_extremes,
    within_years,
};
use crate::domain::{
    AggregatedRecord, AggregatedSeries, AnalysisConfig, CanonicalRecord, CanonicalSeries, FitDegree, Projection, QuadraticModel,
    RawTable, Reduction, TimeKey, TrendModel, YearRange,
};
use crate::error::{AppError, TrendError};
use crate::fit::{EntityTrend, fit_linear, fit_per_entity, fit_quadratic, steepest_entity};
use crate::project::project;
use crate::report::{Conclusion, DecadeHighlight, EntityLeader, Highlight, classify};
use crate::resolve::{ColumnMap, resolve};

/// All computed outputs of one `ct analyze` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub columns: ColumnMap,
    pub normalize: NormalizeReport,
    /// Distinct aggregate entities removed by the denylist.
    pub excluded_entities: Vec<String>,
    /// Canonical rows after all filters.
    pub series: CanonicalSeries,
    /// Per-entity yearly values.
    pub yearly: AggregatedSeries,
    /// Per-entity values grouped by the configured time key.
    pub grouped: AggregatedSeries,
    /// Yearly headline series (entities combined).
    pub headline: AggregatedSeries,
    /// Decade means of the headline series.
    pub decades: AggregatedSeries,
    pub trend: Result<TrendModel, TrendError>,
    /// Present when the preset projects with a quadratic.
    pub quadratic: Option<Result<QuadraticModel, TrendError>>,
    pub projections: Vec<Projection>,
    pub entity_trends: Vec<EntityTrend>,
    pub conclusion: Option<Conclusion>,
}

/// Run the full analysis on an already-read table.
pub fn run_analysis(config: &AnalysisConfig, table: RawTable) -> Result<RunOutput, AppError> {
    let preset = &config.preset;

    if table.is_empty() {
        return Err(AppError::new(3, "No valid rows remain after normalization/filtering."));
    }

    // 1) Reshape and bind columns.
    let table = preset.prepare(table);
    let columns = resolve(&table, &preset.roles)?;
    tracing::debug!(?columns, "resolved columns");

    // 2) Canonical rows.
    let (mut series, report) = normalize(&table, &columns, &preset.normalize)?;
    tracing::info!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        dropped = report.rows_read - report.rows_kept,
        "normalized"
    );

    // 3) Filters.
    let mut excluded_entities = Vec::new();
    if preset.exclude_aggregates && series.has_entities() {
        let (kept, excluded) = exclude_aggregates(&series, &EntityDenylist::default());
        if !excluded.is_empty() {
            tracing::info!(count = excluded.len(), "excluded aggregate entities");
        }
        series = kept;
        excluded_entities = excluded;
    }
    if let Some(range) = config.year_range {
        series = within_years(&series, range)?;
    }
    if !config.entities.is_empty() {
        series = select_entities(&series, &config.entities);
    }
    if series.is_empty() {
        return Err(AppError::new(3, "No valid rows remain after normalization/filtering."));
    }

    // 4) Aggregation.
    let yearly = Aggregator::new(TimeKey::Year)
        .with_reduction(preset.reduction)
        .aggregate(series.records());
    let grouped = match config.time_key {
        TimeKey::Year => yearly.clone(),
        TimeKey::Decade => by_decade(&yearly),
    };
    let headline = if series.has_entities() {
        Aggregator::new(TimeKey::Year)
            .with_reduction(preset.combine)
            .aggregate(unweighted(&yearly, true).records())
    } else {
        yearly.clone()
    };
    let decades = by_decade(&headline);

    // 5) Fits.
    let trend = fit_linear(headline.records());
    if let Err(err) = &trend {
        tracing::warn!(error = %err, "headline trend skipped");
    }
    let entity_trends = if series.has_entities() {
        fit_per_entity(yearly.records())
    } else {
        Vec::new()
    };

    // 6) Projection.
    let last_observed = YearRange::of(headline.records()).map(|r| r.to);
    let (quadratic, projections) = match (preset.projection_degree, last_observed) {
        (FitDegree::Quadratic, Some(last)) => {
            let fit = fit_quadratic(headline.records());
            let rows: Vec<Projection> = match &fit {
                Ok(model) => project(model, last, config.horizon).collect(),
                Err(err) => {
                    tracing::warn!(error = %err, "quadratic projection skipped");
                    Vec::new()
                }
            };
            (Some(fit), rows)
        }
        (FitDegree::Linear, Some(last)) => {
            let rows: Vec<Projection> = match &trend {
                Ok(model) => project(model, last, config.horizon).collect(),
                Err(_) => Vec::new(),
            };
            (None, rows)
        }
        (_, None) => (None, Vec::new()),
    };

    // 7) Conclusion.
    let conclusion = match &trend {
        Ok(model) => conclude(config, *model, &headline, &decades, &projections, &entity_trends).map(|mut c| {
            if series.has_entities() {
                c.leader = latest_leader(&yearly);
            }
            if let Some(Ok(q)) = &quadratic {
                c.acceleration = Some(classify(q.curvature(), config.epsilon));
            }
            c
        }),
        Err(_) => None,
    };

    Ok(RunOutput {
        columns,
        normalize: report,
        excluded_entities,
        series,
        yearly,
        grouped,
        headline,
        decades,
        trend,
        quadratic,
        projections,
        entity_trends,
        conclusion,
    })
}

/// Decade means of a yearly series.
///
/// Means are re-weighted by their row counts (so the result equals the decade
/// mean of the raw rows); yearly totals count once per year.
fn by_decade(yearly: &AggregatedSeries) -> AggregatedSeries {
    let decade = Aggregator::new(TimeKey::Decade);
    match yearly.reduction {
        Reduction::Mean => decade.aggregate(yearly.records()),
        Reduction::Sum => decade.aggregate(unweighted(yearly, false).records()),
    }
}

/// Re-wrap aggregated values as weight-1 points (optionally dropping the entity).
///
/// Used when a group value is itself a total, or when entities are combined with
/// equal weight regardless of how many rows each one had.
fn unweighted(series: &AggregatedSeries, drop_entity: bool) -> CanonicalSeries {
    CanonicalSeries::new(
        series
            .records()
            .iter()
            .map(|r| {
                let entity = if drop_entity { None } else { r.entity.as_deref() };
                CanonicalRecord::new(entity, r.time, r.value)
            })
            .collect(),
    )
}

fn conclude(
    config: &AnalysisConfig,
    model: TrendModel,
    headline: &AggregatedSeries,
    decades: &AggregatedSeries,
    projections: &[Projection],
    entity_trends: &[EntityTrend],
) -> Option<Conclusion> {
    let period = YearRange::of(headline.records())?;
    let value_at = |year: i32| headline.records().iter().find(|r| r.time == year).map(|r| r.value);
    let change = match (value_at(period.from), value_at(period.to)) {
        (Some(first), Some(last)) => Some(last - first),
        _ => None,
    };

    let decade = series_extremes(decades).map(|ext| {
        let pick = match config.preset.highlight {
            Highlight::Highest => ext.max,
            Highlight::Lowest => ext.min,
        };
        DecadeHighlight {
            kind: config.preset.highlight,
            decade: pick.time,
            mean: pick.value,
        }
    });

    Some(Conclusion {
        trend: classify(model.slope, config.epsilon),
        model,
        period,
        change,
        decade,
        at_horizon: projections.last().copied(),
        steepest: steepest_entity(entity_trends).map(|(name, m)| (name.to_string(), m.slope)),
        leader: None,
        acceleration: None,
    })
}

/// Highest-valued entity in the last year of `yearly`; the first one listed wins ties.
fn latest_leader(yearly: &AggregatedSeries) -> Option<EntityLeader> {
    let last = YearRange::of(yearly.records())?.to;
    let mut best: Option<&AggregatedRecord> = None;
    for r in yearly.records().iter().filter(|r| r.time == last && r.entity.is_some()) {
        if best.is_none_or(|b| r.value > b.value) {
            best = Some(r);
        }
    }
    best.and_then(|r| {
        Some(EntityLeader {
            entity: r.entity.clone()?,
            year: r.time,
            value: r.value,
        })
    })
}
