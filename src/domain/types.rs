//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while normalizing and fitting
//! - exported to CSV/JSON
//! - built in tests without touching the filesystem

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::datasets::DatasetPreset;

/// Earliest calendar year accepted in a canonical series.
pub const MIN_YEAR: i32 = 1850;

/// Latest calendar year accepted in a canonical series (and the default horizon).
pub const MAX_YEAR: i32 = 2100;

/// A single raw cell as produced by a file or document reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Missing,
}

impl Scalar {
    /// Classify a raw text cell.
    ///
    /// Empty cells and any of `missing_markers` become `Missing`; finite numbers
    /// become `Number`; anything else is kept as trimmed `Text`.
    pub fn from_cell(cell: &str, missing_markers: &[String]) -> Self {
        let cell = cell.trim();
        if cell.is_empty() || missing_markers.iter().any(|m| m == cell) {
            return Scalar::Missing;
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Scalar::Number(v),
            _ => Scalar::Text(cell.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Scalar::Missing)
    }

    /// Text view of the cell (numbers are rendered), `None` when missing.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Scalar::Missing => None,
            Scalar::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Scalar::Number(v) => Some(Cow::Owned(v.to_string())),
        }
    }
}

/// An ordered, immutable-once-read table of raw cells.
///
/// Every row is aligned to `columns`; absent cells are `Scalar::Missing`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Scalar>) {
        row.resize(self.columns.len(), Scalar::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact (case-sensitive) column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Semantic role of a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Entity,
    Time,
    Value,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Entity => "entity",
            Role::Time => "time",
            Role::Value => "value",
        };
        f.write_str(name)
    }
}

/// Anything that can be grouped, fitted, or exported as an observation.
///
/// `weight` is the number of raw rows the observation stands for (1 for a
/// canonical record, the group count for an aggregated one).
pub trait Observation {
    fn entity(&self) -> Option<&str>;
    fn time(&self) -> i32;
    fn value(&self) -> f64;
    fn weight(&self) -> usize {
        1
    }
}

impl<T: Observation + ?Sized> Observation for &T {
    fn entity(&self) -> Option<&str> {
        (**self).entity()
    }
    fn time(&self) -> i32 {
        (**self).time()
    }
    fn value(&self) -> f64 {
        (**self).value()
    }
    fn weight(&self) -> usize {
        (**self).weight()
    }
}

/// One normalized row: `(entity, year, value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub entity: Option<String>,
    pub time: i32,
    pub value: f64,
}

impl CanonicalRecord {
    pub fn new(entity: Option<&str>, time: i32, value: f64) -> Self {
        Self {
            entity: entity.map(str::to_string),
            time,
            value,
        }
    }
}

impl Observation for CanonicalRecord {
    fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }
    fn time(&self) -> i32 {
        self.time
    }
    fn value(&self) -> f64 {
        self.value
    }
}

/// A normalized series. Transforms always produce a new series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSeries {
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalSeries {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    /// Build a single-series (global) table from `(year, value)` pairs.
    pub fn global(points: &[(i32, f64)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(t, v)| CanonicalRecord::new(None, t, v))
                .collect(),
        )
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_entities(&self) -> bool {
        self.records.iter().any(|r| r.entity.is_some())
    }
}

/// Time bucketing applied before averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeKey {
    Year,
    Decade,
}

impl TimeKey {
    /// Map a calendar year to its group key.
    pub fn key(self, year: i32) -> i32 {
        match self {
            TimeKey::Year => year,
            TimeKey::Decade => year.div_euclid(10) * 10,
        }
    }
}

/// How values inside a group are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Mean,
    Sum,
}

/// One group of an aggregated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub entity: Option<String>,
    /// Group key (the year, or the first year of the decade).
    pub time: i32,
    pub value: f64,
    /// Number of raw rows contributing to the group (always >= 1).
    pub count: usize,
}

impl Observation for AggregatedRecord {
    fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }
    fn time(&self) -> i32 {
        self.time
    }
    fn value(&self) -> f64 {
        self.value
    }
    fn weight(&self) -> usize {
        self.count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub key: TimeKey,
    pub reduction: Reduction,
    pub records: Vec<AggregatedRecord>,
}

impl AggregatedSeries {
    pub fn records(&self) -> &[AggregatedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ordinary least squares line `value = slope * year + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
    /// Population standard deviation (ddof = 0) of the fit residuals.
    pub residual_std: f64,
    pub n_observations: usize,
}

/// Quadratic least squares fit.
///
/// `coefficients` are in ascending power order for raw years:
/// `value = c0 + c1 * year + c2 * year^2`.
/// Evaluation goes through the centred form, which keeps precision for years
/// around 2000 where `year^2` dwarfs the other terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticModel {
    pub coefficients: [f64; 3],
    pub center: f64,
    pub centered_coefficients: [f64; 3],
    pub residual_std: f64,
    pub n_observations: usize,
}

impl QuadraticModel {
    /// The `year^2` coefficient; its sign tells acceleration from deceleration.
    pub fn curvature(&self) -> f64 {
        self.coefficients[2]
    }
}

/// Polynomial degree used for a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitDegree {
    Linear,
    Quadratic,
}

impl FitDegree {
    /// Polynomial degree.
    pub fn degree(self) -> usize {
        match self {
            FitDegree::Linear => 1,
            FitDegree::Quadratic => 2,
        }
    }

    /// Minimum observation count accepted by the fitter.
    pub fn min_observations(self) -> usize {
        match self {
            FitDegree::Linear => 2,
            FitDegree::Quadratic => 6,
        }
    }
}

/// One projected year with its symmetric 95% band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub horizon_time: i32,
    pub predicted_value: f64,
    pub lower_95: f64,
    pub upper_95: f64,
}

/// Inclusive year window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.from && year <= self.to
    }

    /// Observed span of a set of observations.
    pub fn of<O: Observation>(records: &[O]) -> Option<Self> {
        let from = records.iter().map(Observation::time).min()?;
        let to = records.iter().map(Observation::time).max()?;
        Some(Self { from, to })
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Decimal convention for exported numbers.
///
/// `Comma` follows the continental convention: `,` decimal mark with `;` as
/// the field delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecimalLocale {
    Point,
    Comma,
}

impl DecimalLocale {
    pub fn delimiter(self) -> u8 {
        match self {
            DecimalLocale::Point => b',',
            DecimalLocale::Comma => b';',
        }
    }

    pub fn format(self, value: f64) -> String {
        let s = value.to_string();
        match self {
            DecimalLocale::Point => s,
            DecimalLocale::Comma => s.replace('.', ","),
        }
    }
}

impl FromStr for DecimalLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "point" | "en" | "." => Ok(DecimalLocale::Point),
            "comma" | "es" | "," => Ok(DecimalLocale::Comma),
            other => Err(format!("Unknown locale '{other}' (expected point|comma).")),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags, `.env` defaults and the dataset preset.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub preset: DatasetPreset,
    pub input: PathBuf,
    /// Input is a JSON document export instead of CSV.
    pub documents: bool,
    pub time_key: TimeKey,
    pub year_range: Option<YearRange>,
    /// Keep only these entities (case-insensitive); empty keeps all.
    pub entities: Vec<String>,
    pub horizon: i32,
    /// Dead band for trend classification. `0.0` is an exact sign test.
    pub epsilon: f64,
    pub locale: DecimalLocale,
    pub top_n: usize,
    pub export_series: Option<PathBuf>,
    pub export_projection: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}
