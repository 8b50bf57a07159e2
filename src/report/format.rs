//! Run conclusions and the plain-text report printed by `ct analyze`.

use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, FitDegree, Projection, TimeKey, TrendModel, YearRange};
use crate::error::TrendError;
use crate::report::summary::{Trend, format_summary};

/// Which extreme decade a dataset highlights (warmest vs. lowest ice extent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    Highest,
    Lowest,
}

/// An extreme decade of the headline series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecadeHighlight {
    pub kind: Highlight,
    pub decade: i32,
    pub mean: f64,
}

/// Entity with the highest value in the last observed year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLeader {
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// Everything the report says about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub trend: Trend,
    pub model: TrendModel,
    pub period: YearRange,
    /// Last minus first observation of the headline series.
    pub change: Option<f64>,
    pub decade: Option<DecadeHighlight>,
    pub at_horizon: Option<Projection>,
    /// Entity with the largest slope, when per-entity fits exist.
    pub steepest: Option<(String, f64)>,
    pub leader: Option<EntityLeader>,
    /// Sign of the quadratic term, when the projection uses one.
    pub acceleration: Option<Trend>,
}

impl Conclusion {
    pub fn sentence(&self, unit: &str) -> String {
        format_summary(self.trend, self.model.slope, self.period, unit)
    }
}

/// Format the full run report (inputs, trend, decades, projection).
pub fn format_report(run: &RunOutput, config: &AnalysisConfig) -> String {
    let preset = &config.preset;
    let unit = preset.unit.as_str();
    let mut out = String::new();

    out.push_str(&format!("=== ct - {} ===\n", preset.label));
    out.push_str(&format!("Input: {}\n", config.input.display()));
    out.push_str("Columns:");
    for (role, column) in run.columns.iter() {
        out.push_str(&format!(" {role}='{column}'"));
    }
    out.push('\n');
    out.push_str(&format!(
        "Rows: read={} kept={} | dropped: missing={} unparseable={} out-of-range={}\n",
        run.normalize.rows_read,
        run.normalize.rows_kept,
        run.normalize.dropped_missing,
        run.normalize.dropped_unparseable,
        run.normalize.dropped_out_of_range,
    ));
    if !run.excluded_entities.is_empty() {
        out.push_str(&format!(
            "Excluded aggregates: {}\n",
            truncate_list(&run.excluded_entities, 8)
        ));
    }

    out.push_str("\nTrend:\n");
    match (&run.trend, &run.conclusion) {
        (Ok(model), Some(conclusion)) => {
            out.push_str(&format!("- {}\n", conclusion.sentence(unit)));
            out.push_str(&format!(
                "- fit: slope={:.6} intercept={:.6} sigma={:.6} n={}\n",
                model.slope, model.intercept, model.residual_std, model.n_observations
            ));
            if let Some(change) = conclusion.change {
                out.push_str(&format!("- change over period: {}\n", fmt_value(change, unit)));
            }
            if let Some(d) = conclusion.decade {
                let which = match d.kind {
                    Highlight::Highest => "highest",
                    Highlight::Lowest => "lowest",
                };
                out.push_str(&format!(
                    "- {which} decade mean: {}s ({})\n",
                    d.decade,
                    fmt_value(d.mean, unit)
                ));
            }
            if let Some((name, slope)) = &conclusion.steepest {
                out.push_str(&format!("- steepest entity: {name} ({slope:.4} per year)\n"));
            }
            if let Some(leader) = &conclusion.leader {
                out.push_str(&format!(
                    "- highest in {}: {} ({})\n",
                    leader.year,
                    leader.entity,
                    fmt_value(leader.value, unit)
                ));
            }
        }
        (Err(err), _) => out.push_str(&format!("- skipped: {}\n", skip_reason(err))),
        (Ok(_), None) => out.push_str("- skipped: no observations\n"),
    }

    if !run.entity_trends.is_empty() {
        out.push_str("\nPer-entity slopes:\n");
        let mut rows: Vec<(&str, f64)> = run
            .entity_trends
            .iter()
            .filter_map(|t| t.result.as_ref().ok().map(|m| (t.entity.as_str(), m.slope)))
            .collect();
        rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (name, slope) in rows.iter().take(config.top_n) {
            out.push_str(&format!("  {:<32} {:>14.4}\n", truncate(name, 32), slope));
        }
        let skipped = run.entity_trends.iter().filter(|t| t.result.is_err()).count();
        if skipped > 0 {
            out.push_str(&format!("  ({skipped} entities skipped: too few points)\n"));
        }
    }

    if config.time_key == TimeKey::Decade && !run.decades.is_empty() {
        out.push_str("\nDecade means:\n");
        for r in run.decades.records() {
            out.push_str(&format!("  {}s {:>16} (n={})\n", r.time, fmt_value(r.value, unit), r.count));
        }
    }

    let model = match preset.projection_degree {
        FitDegree::Quadratic => "quadratic",
        FitDegree::Linear => "linear",
    };
    out.push_str(&format!("\nProjection to {} ({model}):\n", config.horizon));
    if let (Some(Err(err)), _) | (None, Err(err)) = (&run.quadratic, &run.trend) {
        out.push_str(&format!("- skipped: {}\n", skip_reason(err)));
    } else if let Some(p) = run.conclusion.as_ref().and_then(|c| c.at_horizon) {
        out.push_str(&format!(
            "- {}: {} (95% band {} .. {})\n",
            p.horizon_time,
            fmt_value(p.predicted_value, unit),
            fmt_value(p.lower_95, unit),
            fmt_value(p.upper_95, unit),
        ));
        out.push_str(&format!("- {} projected years\n", run.projections.len()));
        if let Some(acceleration) = run.conclusion.as_ref().and_then(|c| c.acceleration) {
            out.push_str(&format!("- curvature: {}\n", acceleration_label(acceleration)));
        }
    } else {
        out.push_str("- none (horizon is not after the last observation)\n");
    }

    out
}

fn acceleration_label(t: Trend) -> &'static str {
    match t {
        Trend::Ascending => "accelerating increase",
        Trend::Descending => "decelerating (bending downward)",
        Trend::Stable => "no acceleration",
    }
}

fn skip_reason(err: &TrendError) -> String {
    match err {
        TrendError::InsufficientData { .. } => format!("not enough data ({err})"),
        other => other.to_string(),
    }
}

fn fmt_value(v: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{v:.3}")
    } else {
        format!("{v:.3} {unit}")
    }
}

fn truncate_list(items: &[String], max: usize) -> String {
    let shown: Vec<&str> = items.iter().take(max).map(String::as_str).collect();
    if items.len() > max {
        format!("{} (+{} more)", shown.join(", "), items.len() - max)
    } else {
        shown.join(", ")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
