//! Command-line parsing for `ct`.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline. Defaults for the horizon and the export locale may come from the
//! environment (`CT_HORIZON`, `CT_LOCALE`), typically via a `.env` file loaded
//! before parsing; explicit flags always win.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::datasets::DatasetKind;
use crate::domain::{DecimalLocale, MAX_YEAR};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ct", version, about = "Climate and socio-economic trend analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize a dataset, fit its trend, project it and print a report.
    Analyze(AnalyzeArgs),
    /// Print the raw columns of a file and how they map onto roles.
    Columns(ColumnsArgs),
}

/// Input file and how to interpret it.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Dataset preset (column roles, cleaning rules, units).
    #[arg(short = 'd', long, value_enum)]
    pub dataset: DatasetKind,

    /// Input file.
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: PathBuf,

    /// Input is a JSON array / NDJSON document export instead of CSV.
    #[arg(long)]
    pub documents: bool,

    /// Time column candidates (custom dataset), highest priority first.
    #[arg(long = "time", value_name = "CANDIDATE")]
    pub time_candidates: Vec<String>,

    /// Entity column candidates (custom dataset).
    #[arg(long = "entity-col", value_name = "CANDIDATE")]
    pub entity_candidates: Vec<String>,

    /// Value column candidates (custom dataset).
    #[arg(long = "value", value_name = "CANDIDATE")]
    pub value_candidates: Vec<String>,

    /// Unit label (custom dataset).
    #[arg(long, default_value = "")]
    pub unit: String,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Group by decade instead of by year.
    #[arg(long)]
    pub decade: bool,

    /// First year to keep (inclusive).
    #[arg(long)]
    pub from: Option<i32>,

    /// Last year to keep (inclusive).
    #[arg(long)]
    pub to: Option<i32>,

    /// Keep only this entity (repeatable, case-insensitive).
    #[arg(long = "entity", value_name = "NAME")]
    pub entities: Vec<String>,

    /// Projection horizon (last projected year).
    #[arg(long, env = "CT_HORIZON", default_value_t = MAX_YEAR)]
    pub horizon: i32,

    /// Dead band for the ascending/descending classification.
    #[arg(long, default_value_t = 0.0)]
    pub epsilon: f64,

    /// Decimal convention for CSV exports (point|comma).
    #[arg(long, env = "CT_LOCALE", default_value = "point")]
    pub locale: DecimalLocale,

    /// Show top-N entities by slope.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Export the grouped series to CSV.
    #[arg(long = "export-series", value_name = "CSV")]
    pub export_series: Option<PathBuf>,

    /// Export the projection rows to CSV.
    #[arg(long = "export-projection", value_name = "CSV")]
    pub export_projection: Option<PathBuf>,

    /// Export models + projection to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_parses_filters_and_exports() {
        let cli = Cli::try_parse_from([
            "ct",
            "analyze",
            "--dataset",
            "sea-level",
            "--input",
            "gmsl.csv",
            "--decade",
            "--from",
            "1993",
            "--to",
            "2020",
            "--horizon",
            "2050",
            "--locale",
            "comma",
            "--export-projection",
            "out.csv",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.source.dataset, DatasetKind::SeaLevel);
        assert!(args.decade);
        assert_eq!(args.from, Some(1993));
        assert_eq!(args.horizon, 2050);
        assert_eq!(args.locale, DecimalLocale::Comma);
        assert_eq!(args.export_projection, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn custom_candidates_are_repeatable() {
        let cli = Cli::try_parse_from([
            "ct",
            "columns",
            "-d",
            "custom",
            "-i",
            "x.csv",
            "--time",
            "fecha",
            "--time",
            "year",
            "--value",
            "valor",
        ])
        .unwrap();
        let Command::Columns(args) = cli.command else {
            panic!("expected columns");
        };
        assert_eq!(args.source.time_candidates, vec!["fecha", "year"]);
        assert!(args.source.entity_candidates.is_empty());
    }

    #[test]
    fn dataset_is_required() {
        assert!(Cli::try_parse_from(["ct", "analyze", "--input", "x.csv"]).is_err());
    }
}
