//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` defaults and installs logging
//! - parses CLI arguments
//! - reads the input file
//! - runs the shared pipeline
//! - prints the report and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Cli, ColumnsArgs, Command, SourceArgs};
use crate::datasets::{DatasetKind, DatasetPreset, custom, preset};
use crate::domain::{AnalysisConfig, RawTable, TimeKey, YearRange};
use crate::error::AppError;
use crate::io::{ProjectionFile, read_csv, read_documents, write_projection_csv, write_projection_json, write_series_csv};
use crate::resolve::resolve;

pub mod pipeline;

/// Entry point for the `ct` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is the common case.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Columns(args) => handle_columns(&args),
    }
}

/// Logs go to stderr; stdout is reserved for reports.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(args)?;
    let table = read_source(&config.preset, &config.input, config.documents)?;
    let run = pipeline::run_analysis(&config, table)?;

    println!("{}", crate::report::format_report(&run, &config));

    if let Some(path) = &config.export_series {
        write_series_csv(path, run.grouped.records(), true, config.locale)?;
    }
    if let Some(path) = &config.export_projection {
        write_projection_csv(path, &run.projections, config.locale)?;
    }
    if let Some(path) = &config.export_json {
        let doc = ProjectionFile {
            tool: "ct",
            dataset: &config.preset.label,
            unit: &config.preset.unit,
            linear: run.trend.as_ref().ok(),
            quadratic: run.quadratic.as_ref().and_then(|q| q.as_ref().ok()),
            projection: &run.projections,
        };
        write_projection_json(path, &doc)?;
    }

    Ok(())
}

fn handle_columns(args: &ColumnsArgs) -> Result<(), AppError> {
    let preset = preset_from_args(&args.source)?;
    let table = preset.prepare(read_source(&preset, &args.source.input, args.source.documents)?);

    let mut out = String::new();
    out.push_str(&format!("Columns ({}):\n", table.columns().len()));
    for (idx, name) in table.columns().iter().enumerate() {
        out.push_str(&format!("  [{idx}] {name}\n"));
    }
    out.push_str(&format!("\nRoles for dataset '{}':\n", preset.label));
    match resolve(&table, &preset.roles) {
        Ok(map) => {
            for (role, column) in map.iter() {
                out.push_str(&format!("  {role:<7} -> {column}\n"));
            }
        }
        Err(err) => out.push_str(&format!("  unresolved: {err}\n")),
    }
    println!("{out}");
    Ok(())
}

fn read_source(preset: &DatasetPreset, input: &Path, documents: bool) -> Result<RawTable, AppError> {
    if documents {
        read_documents(input, &preset.read.missing_markers)
    } else {
        read_csv(input, &preset.read)
    }
}

fn preset_from_args(source: &SourceArgs) -> Result<DatasetPreset, AppError> {
    match source.dataset {
        DatasetKind::Custom => {
            if source.time_candidates.is_empty() || source.value_candidates.is_empty() {
                return Err(AppError::new(
                    2,
                    "The custom dataset needs at least one --time and one --value candidate.",
                ));
            }
            Ok(custom(
                &source.time_candidates,
                &source.entity_candidates,
                &source.value_candidates,
                &source.unit,
            ))
        }
        kind => Ok(preset(kind)),
    }
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> Result<AnalysisConfig, AppError> {
    let preset = preset_from_args(&args.source)?;
    let year_range = match (args.from, args.to) {
        (None, None) => None,
        (from, to) => Some(YearRange::new(
            from.unwrap_or(preset.normalize.year_bounds.0),
            to.unwrap_or(preset.normalize.year_bounds.1),
        )),
    };

    Ok(AnalysisConfig {
        preset,
        input: args.source.input.clone(),
        documents: args.source.documents,
        time_key: if args.decade { TimeKey::Decade } else { TimeKey::Year },
        year_range,
        entities: args.entities.clone(),
        horizon: args.horizon,
        epsilon: args.epsilon.abs(),
        locale: args.locale,
        top_n: args.top,
        export_series: args.export_series.clone(),
        export_projection: args.export_projection.clone(),
        export_json: args.export_json.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> AnalyzeArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Analyze(args) => args,
            Command::Columns(_) => panic!("expected analyze"),
        }
    }

    #[test]
    fn open_ended_window_uses_preset_bounds() {
        let args = parse(&["ct", "analyze", "-d", "temperature", "-i", "t.csv", "--from", "1950"]);
        let config = analysis_config_from_args(&args).unwrap();
        assert_eq!(config.year_range, Some(YearRange::new(1950, 2100)));
        assert_eq!(config.time_key, TimeKey::Year);
    }

    #[test]
    fn custom_dataset_requires_candidates() {
        let args = parse(&["ct", "analyze", "-d", "custom", "-i", "t.csv", "--time", "year"]);
        let err = analysis_config_from_args(&args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
