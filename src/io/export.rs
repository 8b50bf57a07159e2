//! Export series and projections to CSV / JSON.
//!
//! CSV output follows the chosen [`DecimalLocale`]: `Comma` writes `,` as the
//! decimal mark and `;` between fields so spreadsheets in those locales open it
//! cleanly.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::{DecimalLocale, Observation, Projection, QuadraticModel, TrendModel};
use crate::error::AppError;

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create {what} '{}': {e}", path.display())))
}

fn writer(file: File, locale: DecimalLocale) -> csv::Writer<File> {
    csv::WriterBuilder::new()
        .delimiter(locale.delimiter())
        .from_writer(file)
}

fn csv_err(e: csv::Error) -> AppError {
    AppError::new(2, format!("Failed to write export CSV: {e}"))
}

/// Write `entity,time,value[,count]` rows.
///
/// The `count` column is written when `with_count` is set (aggregated series).
pub fn write_series_csv<O: Observation>(
    path: &Path,
    records: &[O],
    with_count: bool,
    locale: DecimalLocale,
) -> Result<(), AppError> {
    let mut w = writer(create(path, "series CSV")?, locale);

    let mut header = vec!["entity", "time", "value"];
    if with_count {
        header.push("count");
    }
    w.write_record(&header).map_err(csv_err)?;

    for r in records {
        let mut row = vec![
            r.entity().unwrap_or("").to_string(),
            r.time().to_string(),
            locale.format(r.value()),
        ];
        if with_count {
            row.push(r.weight().to_string());
        }
        w.write_record(&row).map_err(csv_err)?;
    }

    w.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote series csv");
    Ok(())
}

/// Write `time,predicted,lower_95,upper_95` rows.
pub fn write_projection_csv(path: &Path, projections: &[Projection], locale: DecimalLocale) -> Result<(), AppError> {
    let mut w = writer(create(path, "projection CSV")?, locale);
    w.write_record(["time", "predicted", "lower_95", "upper_95"])
        .map_err(csv_err)?;
    for p in projections {
        w.write_record([
            p.horizon_time.to_string(),
            locale.format(p.predicted_value),
            locale.format(p.lower_95),
            locale.format(p.upper_95),
        ])
        .map_err(csv_err)?;
    }
    w.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    tracing::info!(path = %path.display(), rows = projections.len(), "wrote projection csv");
    Ok(())
}

/// Portable JSON form of a run's fitted model and projection.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionFile<'a> {
    pub tool: &'static str,
    pub dataset: &'a str,
    pub unit: &'a str,
    pub linear: Option<&'a TrendModel>,
    pub quadratic: Option<&'a QuadraticModel>,
    pub projection: &'a [Projection],
}

pub fn write_projection_json(path: &Path, doc: &ProjectionFile<'_>) -> Result<(), AppError> {
    let file = create(path, "projection JSON")?;
    serde_json::to_writer_pretty(file, doc)
        .map_err(|e| AppError::new(2, format!("Failed to write projection JSON: {e}")))?;
    tracing::info!(path = %path.display(), "wrote projection json");
    Ok(())
}
