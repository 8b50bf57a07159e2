//! Document-collection exports (JSON array or NDJSON) into a [`RawTable`].

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::{RawTable, Scalar};
use crate::error::AppError;

/// Read a JSON array of objects or one object per line.
pub fn read_documents(path: &Path, missing_markers: &[String]) -> Result<RawTable, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to open documents '{}': {e}", path.display())))?;
    let table = parse_documents_str(&text, missing_markers)?;
    tracing::info!(
        path = %path.display(),
        columns = table.columns().len(),
        rows = table.len(),
        "read documents"
    );
    Ok(table)
}

pub fn parse_documents_str(text: &str, missing_markers: &[String]) -> Result<RawTable, AppError> {
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Ok(RawTable::default());
    }

    let docs: Vec<Map<String, Value>> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| AppError::new(2, format!("Invalid JSON documents: {e}")))?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line)
                    .map_err(|e| AppError::new(2, format!("Invalid JSON document on line {}: {e}", idx + 1)))
            })
            .collect::<Result<_, _>>()?
    };

    let mut columns: Vec<String> = Vec::new();
    for doc in &docs {
        for key in doc.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(columns.clone());
    for doc in &docs {
        let row = columns
            .iter()
            .map(|c| match doc.get(c) {
                Some(v) => json_cell(v, missing_markers),
                None => Scalar::Missing,
            })
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_cell(value: &Value, missing_markers: &[String]) -> Scalar {
    match value {
        Value::Null => Scalar::Missing,
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Scalar::Number(v),
            _ => Scalar::Text(n.to_string()),
        },
        Value::String(s) => Scalar::from_cell(s, missing_markers),
        other => Scalar::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_columns_are_union_in_first_seen_order() {
        let text = r#"[
            {"country": "Spain", "year": 2010, "co2": 270.1},
            {"country": "France", "year": 2010, "co2": null, "iso_code": "FRA"}
        ]"#;
        let table = parse_documents_str(text, &[]).unwrap();
        assert_eq!(table.columns(), ["country", "year", "co2", "iso_code"]);
        assert_eq!(table.rows()[0][3], Scalar::Missing);
        assert_eq!(table.rows()[1][2], Scalar::Missing);
        assert_eq!(table.rows()[1][3], Scalar::Text("FRA".to_string()));
    }

    #[test]
    fn ndjson_lines_are_documents() {
        let text = "{\"year\": \"1990\", \"extent\": 6.2}\n\n{\"year\": 1991, \"extent\": \"NA\"}\n";
        let table = parse_documents_str(text, &["NA".to_string()]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], Scalar::Number(1990.0));
        assert_eq!(table.rows()[1][1], Scalar::Missing);
    }

    #[test]
    fn nested_values_become_text() {
        let table = parse_documents_str(r#"[{"tags": ["a"], "ok": true}]"#, &[]).unwrap();
        assert_eq!(table.rows()[0][0], Scalar::Text("[\"a\"]".to_string()));
        assert_eq!(table.rows()[0][1], Scalar::Text("true".to_string()));
    }

    #[test]
    fn invalid_json_is_an_input_error() {
        let err = parse_documents_str("{not json}", &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
