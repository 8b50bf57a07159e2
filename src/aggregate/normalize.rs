//! Normalization: resolved raw columns -> `CanonicalSeries`.
//!
//! Policy:
//! - missing cells drop the row (never zero-filled)
//! - unparseable `time`/`value` cells drop the row while `drop_unparseable`
//!   holds; otherwise the first one is reported as an error
//! - years outside `year_bounds`, sentinel values and values outside
//!   `value_bounds` drop the row
//! - an empty table yields an empty series

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalRecord, CanonicalSeries, MAX_YEAR, MIN_YEAR, RawTable, Role, Scalar};
use crate::error::TrendError;
use crate::resolve::ColumnMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    pub drop_unparseable: bool,
    /// Inclusive calendar-year window.
    pub year_bounds: (i32, i32),
    /// Inclusive value window (e.g. sea level `[-100, 100]` mm).
    pub value_bounds: Option<(f64, f64)>,
    /// Error codes used in place of a value (e.g. `-999`).
    pub sentinels: Vec<f64>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            drop_unparseable: true,
            year_bounds: (MIN_YEAR, MAX_YEAR),
            value_bounds: None,
            sentinels: Vec::new(),
        }
    }
}

/// What happened to the rows of one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped_missing: usize,
    pub dropped_unparseable: usize,
    pub dropped_out_of_range: usize,
}

enum RowOutcome {
    Kept(CanonicalRecord),
    Missing,
    Unparseable { column: String, value: String },
    OutOfRange,
}

/// Rename resolved columns to canonical fields and coerce types.
///
/// The entity is required exactly when `map` resolves an entity column.
pub fn normalize(
    table: &RawTable,
    map: &ColumnMap,
    opts: &NormalizeOptions,
) -> Result<(CanonicalSeries, NormalizeReport), TrendError> {
    let time_idx = column_index(table, map, Role::Time)?;
    let value_idx = column_index(table, map, Role::Value)?;
    let entity_idx = match map.get(Role::Entity) {
        Some(_) => Some(column_index(table, map, Role::Entity)?),
        None => None,
    };

    let mut report = NormalizeReport {
        rows_read: table.len(),
        ..NormalizeReport::default()
    };
    let mut records = Vec::with_capacity(table.len());

    for (idx, row) in table.rows().iter().enumerate() {
        let outcome = normalize_row(row, table.columns(), time_idx, value_idx, entity_idx, opts);
        match outcome {
            RowOutcome::Kept(record) => records.push(record),
            RowOutcome::Missing => report.dropped_missing += 1,
            RowOutcome::OutOfRange => report.dropped_out_of_range += 1,
            RowOutcome::Unparseable { column, value } => {
                if !opts.drop_unparseable {
                    return Err(TrendError::Unparseable {
                        row: idx + 1,
                        column,
                        value,
                    });
                }
                report.dropped_unparseable += 1;
            }
        }
    }

    report.rows_kept = records.len();
    tracing::debug!(
        rows_read = report.rows_read,
        rows_kept = report.rows_kept,
        dropped_missing = report.dropped_missing,
        dropped_unparseable = report.dropped_unparseable,
        dropped_out_of_range = report.dropped_out_of_range,
        "normalized table"
    );

    Ok((CanonicalSeries::new(records), report))
}

fn column_index(table: &RawTable, map: &ColumnMap, role: Role) -> Result<usize, TrendError> {
    map.get(role)
        .and_then(|name| table.column_index(name))
        .ok_or_else(|| TrendError::ColumnResolution {
            role,
            available_columns: table.columns().to_vec(),
        })
}

fn normalize_row(
    row: &[Scalar],
    columns: &[String],
    time_idx: usize,
    value_idx: usize,
    entity_idx: Option<usize>,
    opts: &NormalizeOptions,
) -> RowOutcome {
    let entity = match entity_idx {
        Some(idx) => match row[idx].as_text() {
            Some(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
            _ => return RowOutcome::Missing,
        },
        None => None,
    };

    let time_cell = &row[time_idx];
    let value_cell = &row[value_idx];
    if time_cell.is_missing() || value_cell.is_missing() {
        return RowOutcome::Missing;
    }

    let Some(time) = coerce_year(time_cell) else {
        return unparseable(&columns[time_idx], time_cell);
    };
    let Some(value) = coerce_value(value_cell) else {
        return unparseable(&columns[value_idx], value_cell);
    };

    let (year_min, year_max) = opts.year_bounds;
    if time < year_min || time > year_max {
        return RowOutcome::OutOfRange;
    }
    if opts.sentinels.iter().any(|s| *s == value) {
        return RowOutcome::OutOfRange;
    }
    if let Some((lo, hi)) = opts.value_bounds {
        if value < lo || value > hi {
            return RowOutcome::OutOfRange;
        }
    }

    RowOutcome::Kept(CanonicalRecord { entity, time, value })
}

fn unparseable(column: &str, cell: &Scalar) -> RowOutcome {
    RowOutcome::Unparseable {
        column: column.to_string(),
        value: cell.as_text().map(|s| s.into_owned()).unwrap_or_default(),
    }
}

/// Coerce a cell to a calendar year.
///
/// Numbers are truncated (a decimal year `1993.04` is 1993); text is tried as a
/// number, then as one of a few common date layouts.
pub fn coerce_year(cell: &Scalar) -> Option<i32> {
    match cell {
        Scalar::Number(v) => year_from_f64(*v),
        Scalar::Text(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<f64>() {
                return year_from_f64(v);
            }
            parse_date_year(s)
        }
        Scalar::Missing => None,
    }
}

/// Coerce a cell to a finite float.
pub fn coerce_value(cell: &Scalar) -> Option<f64> {
    let v = match cell {
        Scalar::Number(v) => *v,
        Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
        Scalar::Missing => return None,
    };
    v.is_finite().then_some(v)
}

fn year_from_f64(v: f64) -> Option<i32> {
    if !v.is_finite() || v.abs() > i32::MAX as f64 {
        return None;
    }
    Some(v.trunc() as i32)
}

fn parse_date_year(s: &str) -> Option<i32> {
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.year());
        }
    }
    // Month-only stamps such as `1993-01`.
    let (year, month) = s.split_once('-')?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{RoleSpec, resolve};

    fn table(columns: &[&str], rows: Vec<Vec<Scalar>>) -> RawTable {
        let mut t = RawTable::new(columns.iter().map(|s| s.to_string()).collect());
        for r in rows {
            t.push_row(r);
        }
        t
    }

    fn num(v: f64) -> Scalar {
        Scalar::Number(v)
    }

    fn text(s: &str) -> Scalar {
        Scalar::Text(s.to_string())
    }

    fn entity_spec() -> RoleSpec {
        RoleSpec::new()
            .optional(Role::Entity, &["country"])
            .required(Role::Time, &["year"])
            .required(Role::Value, &["value"])
    }

    #[test]
    fn drops_unparseable_rows_instead_of_failing() {
        let t = table(
            &["Country", "Year", "Value"],
            vec![
                vec![text("Spain"), num(2000.0), num(1.5)],
                vec![text("Spain"), text("n/a"), num(1.6)],
                vec![text("Spain"), num(2002.0), text("***")],
                vec![text("Spain"), num(2003.0), text("1.8")],
            ],
        );
        let map = resolve(&t, &entity_spec()).unwrap();
        let (series, report) = normalize(&t, &map, &NormalizeOptions::default()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(report.dropped_unparseable, 2);
        assert_eq!(series.records[1], CanonicalRecord::new(Some("Spain"), 2003, 1.8));
    }

    #[test]
    fn strict_policy_reports_first_unparseable_cell() {
        let t = table(
            &["Year", "Value"],
            vec![vec![num(2000.0), num(1.0)], vec![num(2001.0), text("abc")]],
        );
        let map = resolve(&t, &entity_spec()).unwrap();
        let opts = NormalizeOptions {
            drop_unparseable: false,
            ..NormalizeOptions::default()
        };
        let err = normalize(&t, &map, &opts).unwrap_err();
        assert_eq!(
            err,
            TrendError::Unparseable {
                row: 2,
                column: "Value".to_string(),
                value: "abc".to_string(),
            }
        );
    }

    #[test]
    fn missing_entity_drops_row_when_entity_resolved() {
        let t = table(
            &["Country", "Year", "Value"],
            vec![
                vec![Scalar::Missing, num(2000.0), num(1.0)],
                vec![text("France"), num(2000.0), num(2.0)],
            ],
        );
        let map = resolve(&t, &entity_spec()).unwrap();
        let (series, report) = normalize(&t, &map, &NormalizeOptions::default()).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(report.dropped_missing, 1);
    }

    #[test]
    fn global_series_has_no_entity() {
        let t = table(&["Year", "Value"], vec![vec![num(2000.0), num(1.0)]]);
        let map = resolve(&t, &entity_spec()).unwrap();
        let (series, _) = normalize(&t, &map, &NormalizeOptions::default()).unwrap();
        assert_eq!(series.records[0].entity, None);
    }

    #[test]
    fn out_of_range_years_and_sentinels_are_dropped() {
        let t = table(
            &["Year", "Value"],
            vec![
                vec![num(1700.0), num(1.0)],
                vec![num(1993.0), num(-999.0)],
                vec![num(1994.0), num(250.0)],
                vec![num(1995.0), num(3.0)],
            ],
        );
        let map = resolve(&t, &entity_spec()).unwrap();
        let opts = NormalizeOptions {
            value_bounds: Some((-100.0, 100.0)),
            sentinels: vec![-999.0],
            ..NormalizeOptions::default()
        };
        let (series, report) = normalize(&t, &map, &opts).unwrap();
        assert_eq!(series.records, vec![CanonicalRecord::new(None, 1995, 3.0)]);
        assert_eq!(report.dropped_out_of_range, 3);
    }

    #[test]
    fn empty_table_yields_empty_series() {
        let t = table(&["Year", "Value"], vec![]);
        let map = resolve(&t, &entity_spec()).unwrap();
        let (series, report) = normalize(&t, &map, &NormalizeOptions::default()).unwrap();
        assert!(series.is_empty());
        assert_eq!(report.rows_read, 0);
    }

    #[test]
    fn coerce_year_accepts_dates_and_decimal_years() {
        assert_eq!(coerce_year(&text("1993-01-15")), Some(1993));
        assert_eq!(coerce_year(&text("15/06/2004")), Some(2004));
        assert_eq!(coerce_year(&text("2010-07")), Some(2010));
        assert_eq!(coerce_year(&num(1993.0417)), Some(1993));
        assert_eq!(coerce_year(&text("1999")), Some(1999));
        assert_eq!(coerce_year(&text("nineteen")), None);
    }
}
