//! Dataset presets.
//!
//! Each supported source is described by data, not code: how to read the file,
//! which columns play which role, how to clean values, and how to present the
//! result. The pipeline itself is the same for all of them.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::aggregate::{EntityDenylist, NormalizeOptions, drop_aggregate_rows, melt};
use crate::domain::{FitDegree, RawTable, Reduction, Role};
use crate::io::ReadOptions;
use crate::report::Highlight;
use crate::resolve::{RoleSpec, normalize_header_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    Temperature,
    Greenhouse,
    SeaLevel,
    SeaIce,
    Emissions,
    Population,
    Gdp,
    Energy,
    Custom,
}

/// Physical shape of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// One row per observation.
    Long,
    /// One row per (country, year), one column per energy source.
    WideEnergy,
}

/// Entity column name produced by melting a wide energy table.
pub const SOURCE_COLUMN: &str = "source";
/// Value column name produced by melting a wide energy table.
pub const CONSUMPTION_COLUMN: &str = "consumption";

const NON_ENERGY_COLUMNS: [&str; 10] = [
    "country",
    "country name",
    "iso_code",
    "iso code",
    "iso",
    "region",
    "year",
    "population",
    "gdp",
    "continent",
];

const NON_TOTAL_FRAGMENTS: [&str; 6] = ["per_capita", "share", "change_pct", "change_twh", "intensity", "pct"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetPreset {
    pub kind: DatasetKind,
    pub label: String,
    pub unit: String,
    pub layout: Layout,
    pub read: ReadOptions,
    pub roles: RoleSpec,
    pub normalize: NormalizeOptions,
    /// Drop region / income-group rows before grouping.
    pub exclude_aggregates: bool,
    /// Reduction inside one `(entity, year)` group.
    pub reduction: Reduction,
    /// Reduction across entities for the headline series.
    pub combine: Reduction,
    /// Degree used for the projection to the horizon.
    pub projection_degree: FitDegree,
    pub highlight: Highlight,
}

impl DatasetPreset {
    fn base(kind: DatasetKind, label: &str, unit: &str, roles: RoleSpec) -> Self {
        Self {
            kind,
            label: label.to_string(),
            unit: unit.to_string(),
            layout: Layout::Long,
            read: ReadOptions::default(),
            roles,
            normalize: NormalizeOptions::default(),
            exclude_aggregates: false,
            reduction: Reduction::Mean,
            combine: Reduction::Mean,
            projection_degree: FitDegree::Linear,
            highlight: Highlight::Highest,
        }
    }

    /// Country-level tables (emissions, population, GDP).
    fn by_country(kind: DatasetKind, label: &str, unit: &str, entity: &[&str], value: &[&str]) -> Self {
        let roles = RoleSpec::new()
            .required(Role::Entity, entity)
            .required(Role::Time, &["year"])
            .required(Role::Value, value);
        let mut preset = Self::base(kind, label, unit, roles);
        preset.read.missing_markers = markers(&["..", "NA", "N/A"]);
        preset.exclude_aggregates = true;
        preset
    }

    /// Reshape the raw table into the preset's long layout.
    pub fn prepare(&self, table: RawTable) -> RawTable {
        match self.layout {
            Layout::Long => table,
            Layout::WideEnergy => prepare_energy(table),
        }
    }
}

fn markers(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Built-in preset for a dataset kind.
///
/// `Custom` returns an empty role table; use [`custom`] to fill it.
pub fn preset(kind: DatasetKind) -> DatasetPreset {
    match kind {
        DatasetKind::Temperature => {
            let roles = RoleSpec::new()
                .required(Role::Time, &["year"])
                .required(Role::Value, &["j-d"]);
            let mut p = DatasetPreset::base(kind, "Global temperature anomaly", "°C", roles);
            p.read.skip_rows = 1;
            p.read.missing_markers = markers(&["***"]);
            p.projection_degree = FitDegree::Quadratic;
            p
        }
        DatasetKind::Greenhouse => {
            let roles = RoleSpec::new()
                .required(Role::Time, &["year"])
                .required(Role::Value, &["average", "trend", "value"]);
            let mut p = DatasetPreset::base(kind, "CO₂ concentration", "ppm", roles);
            p.read.comment_prefix = Some("#".to_string());
            p.read.header_contains = markers(&["year", "average"]);
            p.normalize.sentinels = vec![-99.99, -999.99];
            p
        }
        DatasetKind::SeaLevel => {
            let roles = RoleSpec::new()
                .required(Role::Time, &["date"])
                .required(Role::Value, &["sea_level"]);
            let mut p = DatasetPreset::base(kind, "Global mean sea level", "mm", roles);
            p.read.skip_rows = 1;
            p.read.column_names = Some(markers(&["date", "sea_level"]));
            p.normalize.sentinels = vec![-999.0];
            p.normalize.value_bounds = Some((-100.0, 100.0));
            p
        }
        DatasetKind::SeaIce => {
            let roles = RoleSpec::new()
                .required(Role::Time, &["year"])
                .required(Role::Value, &["extent"]);
            let mut p = DatasetPreset::base(kind, "Sea ice extent", "million km²", roles);
            p.normalize.sentinels = vec![-9999.0];
            p.highlight = Highlight::Lowest;
            p
        }
        DatasetKind::Emissions => DatasetPreset::by_country(
            kind,
            "CO₂ emissions",
            "Mt CO₂",
            &["country", "entity"],
            &["co2", "emission", "value"],
        ),
        DatasetKind::Population => DatasetPreset::by_country(
            kind,
            "Population",
            "inhabitants",
            &["country name", "country", "entity"],
            &["population", "value"],
        ),
        DatasetKind::Gdp => DatasetPreset::by_country(
            kind,
            "GDP",
            "USD",
            &["country name", "country", "entity"],
            &["gdp", "value"],
        ),
        DatasetKind::Energy => {
            let roles = RoleSpec::new()
                .required(Role::Entity, &[SOURCE_COLUMN])
                .required(Role::Time, &["year"])
                .required(Role::Value, &[CONSUMPTION_COLUMN]);
            let mut p = DatasetPreset::base(kind, "Energy consumption", "TWh", roles);
            p.layout = Layout::WideEnergy;
            p.reduction = Reduction::Sum;
            p.combine = Reduction::Sum;
            p
        }
        DatasetKind::Custom => DatasetPreset::base(kind, "Custom series", "", RoleSpec::new()),
    }
}

/// Custom preset from user-supplied candidates.
///
/// The entity role is only declared (and then required) when candidates are given.
pub fn custom(time: &[String], entity: &[String], value: &[String], unit: &str) -> DatasetPreset {
    fn as_refs(v: &[String]) -> Vec<&str> {
        v.iter().map(String::as_str).collect()
    }
    let mut roles = RoleSpec::new();
    if !entity.is_empty() {
        roles = roles.required(Role::Entity, &as_refs(entity));
    }
    roles = roles
        .required(Role::Time, &as_refs(time))
        .required(Role::Value, &as_refs(value));

    let mut p = DatasetPreset::base(DatasetKind::Custom, "Custom series", unit, roles);
    p.read.missing_markers = markers(&["NA", "N/A"]);
    p.exclude_aggregates = !entity.is_empty();
    p
}

/// Absolute consumption / generation columns of an energy-mix table.
pub fn is_energy_column(name: &str) -> bool {
    let c = normalize_header_name(name);
    if NON_ENERGY_COLUMNS.contains(&c.as_str()) {
        return false;
    }
    if NON_TOTAL_FRAGMENTS.iter().any(|f| c.contains(f)) {
        return false;
    }
    c.ends_with("_consumption") || c.ends_with("_electricity") || c.ends_with("_generation")
}

fn find_column<'a>(table: &'a RawTable, names: &[&str]) -> Option<&'a str> {
    table
        .columns()
        .iter()
        .find(|c| names.contains(&normalize_header_name(c).as_str()))
        .map(String::as_str)
}

/// Drop aggregate countries, then melt energy columns to `(year, source, consumption)`.
///
/// Tables without a year column are returned as they are so that column
/// resolution reports what is missing.
fn prepare_energy(table: RawTable) -> RawTable {
    let table = match find_column(&table, &["country", "country name"]) {
        Some(col) => drop_aggregate_rows(&table, col, &EntityDenylist::default()),
        None => table,
    };
    let Some(year) = find_column(&table, &["year"]).map(str::to_string) else {
        return table;
    };
    let sources: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| is_energy_column(c))
        .cloned()
        .collect();
    tracing::debug!(sources = sources.len(), "melting energy columns");
    melt(&table, &year, &sources, SOURCE_COLUMN, CONSUMPTION_COLUMN)
}
