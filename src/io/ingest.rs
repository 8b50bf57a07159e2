//! CSV ingest.
//!
//! Turns a source file into a [`RawTable`] of untyped cells. Interpretation of
//! the cells (roles, years, values) happens later in `resolve` / `aggregate`.
//!
//! Source files are messy in a few recurring ways, each covered by
//! [`ReadOptions`]:
//! - a title line above the header (GISTEMP)
//! - `#` comment blocks before the header, which is found by its tokens (NOAA)
//! - header-less files with a known layout (sea level)
//! - placeholder cells such as `***` or `NA`

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{RawTable, Scalar};
use crate::error::AppError;
use crate::resolve::normalize_header_name;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Leading lines dropped before anything else.
    pub skip_rows: usize,
    /// Lines starting with this prefix are ignored.
    pub comment_prefix: Option<String>,
    /// The header is the first line containing all of these lowercase tokens.
    pub header_contains: Vec<String>,
    /// Names for header-less files; when set, every remaining line is data.
    pub column_names: Option<Vec<String>>,
    /// Cell texts read as missing.
    pub missing_markers: Vec<String>,
}

/// Read a CSV file into a raw table.
pub fn read_csv(path: &Path, opts: &ReadOptions) -> Result<RawTable, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = parse_csv_str(&text, opts)?;
    tracing::info!(
        path = %path.display(),
        columns = table.columns().len(),
        rows = table.len(),
        "read csv"
    );
    Ok(table)
}

/// Parse CSV text into a raw table.
pub fn parse_csv_str(text: &str, opts: &ReadOptions) -> Result<RawTable, AppError> {
    let lines = data_lines(text, opts);
    if lines.is_empty() {
        return Ok(match &opts.column_names {
            Some(names) => RawTable::new(names.clone()),
            None => RawTable::default(),
        });
    }

    let body = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(opts.column_names.is_none())
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let columns: Vec<String> = match &opts.column_names {
        Some(names) => names.clone(),
        None => reader
            .headers()
            .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect(),
    };

    let mut table = RawTable::new(columns);
    let mut bad_records = 0usize;
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                bad_records += 1;
                tracing::warn!(error = %e, "skipping malformed CSV record");
                continue;
            }
        };
        let row = record
            .iter()
            .map(|cell| Scalar::from_cell(cell, &opts.missing_markers))
            .collect();
        table.push_row(row);
    }
    if bad_records > 0 {
        tracing::debug!(bad_records, "malformed CSV records skipped");
    }

    Ok(table)
}

/// Apply `skip_rows`, comments and header sniffing; blank lines are dropped.
fn data_lines<'a>(text: &'a str, opts: &ReadOptions) -> Vec<&'a str> {
    let lines: Vec<&str> = text
        .lines()
        .skip(opts.skip_rows)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| match &opts.comment_prefix {
            Some(prefix) => !line.trim_start().starts_with(prefix.as_str()),
            None => true,
        })
        .collect();

    if opts.header_contains.is_empty() || opts.column_names.is_some() {
        return lines;
    }

    let header_at = lines.iter().position(|line| {
        let lower = normalize_header_name(line);
        opts.header_contains
            .iter()
            .all(|token| lower.contains(token.to_lowercase().as_str()))
    });
    match header_at {
        Some(idx) => lines[idx..].to_vec(),
        None => lines,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_file_after_title_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Land-Ocean: Global Means").unwrap();
        writeln!(file, "Year,Jan,J-D").unwrap();
        writeln!(file, "1880,-0.19,-0.17").unwrap();
        writeln!(file, "2024,1.24,***").unwrap();

        let opts = ReadOptions {
            skip_rows: 1,
            missing_markers: vec!["***".to_string()],
            ..ReadOptions::default()
        };
        let table = read_csv(file.path(), &opts).unwrap();
        assert_eq!(table.columns(), ["Year", "Jan", "J-D"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][2], Scalar::Number(-0.17));
        assert_eq!(table.rows()[1][2], Scalar::Missing);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_csv(&dir.path().join("absent.csv"), &ReadOptions::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_text_gives_empty_table() {
        let table = parse_csv_str("", &ReadOptions::default()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn header_is_found_by_tokens_behind_comments() {
        let text = "\
# NOAA monthly means
# source: Mauna Loa
year,month,decimal,average,trend
1958,3,1958.2027,315.70,314.43
1958,4,1958.2877,317.45,315.16
";
        let opts = ReadOptions {
            comment_prefix: Some("#".to_string()),
            header_contains: vec!["year".to_string(), "average".to_string()],
            ..ReadOptions::default()
        };
        let table = parse_csv_str(text, &opts).unwrap();
        assert_eq!(table.column_index("average"), Some(3));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unmatched_header_tokens_fall_back_to_first_line() {
        let text = "date,ppm\n2001-01-01,370.1\n";
        let opts = ReadOptions {
            header_contains: vec!["average".to_string()],
            ..ReadOptions::default()
        };
        let table = parse_csv_str(text, &opts).unwrap();
        assert_eq!(table.columns(), ["date", "ppm"]);
    }

    #[test]
    fn explicit_column_names_keep_every_line_as_data() {
        let text = "1993.01,-38.6\n1993.04,-41.2\n";
        let opts = ReadOptions {
            column_names: Some(vec!["date".to_string(), "sea_level".to_string()]),
            ..ReadOptions::default()
        };
        let table = parse_csv_str(text, &opts).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1][1], Scalar::Number(-41.2));
    }

    #[test]
    fn bom_and_padding_are_stripped_from_headers() {
        let text = "\u{feff}Country Name , Year,Value\nSpain,2010,46.5\nFrance,2010\n";
        let table = parse_csv_str(text, &ReadOptions::default()).unwrap();
        assert_eq!(table.columns(), ["Country Name", "Year", "Value"]);
        assert_eq!(table.rows()[1][2], Scalar::Missing);
    }
}
