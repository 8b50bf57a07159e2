//! Wide-to-long reshaping of raw tables.
//!
//! Energy-mix files carry one column per source (`coal_consumption`,
//! `solar_consumption`...). Melting them yields one row per `(year, source)`
//! so the source can play the entity role.

use crate::aggregate::denylist::EntityDenylist;
use crate::domain::{RawTable, Scalar};

/// Melt `value_columns` into `(id, entity_column, value_column)` rows.
///
/// Value columns that are not present in `table` are ignored. Missing cells are
/// carried through (normalization drops them).
pub fn melt(
    table: &RawTable,
    id_column: &str,
    value_columns: &[String],
    entity_column: &str,
    value_column: &str,
) -> RawTable {
    let mut out = RawTable::new(vec![
        id_column.to_string(),
        entity_column.to_string(),
        value_column.to_string(),
    ]);
    let Some(id_idx) = table.column_index(id_column) else {
        return out;
    };

    let sources: Vec<(usize, &String)> = value_columns
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (idx, name)))
        .collect();

    for row in table.rows() {
        for (idx, name) in &sources {
            out.push_row(vec![
                row[id_idx].clone(),
                Scalar::Text((*name).clone()),
                row[*idx].clone(),
            ]);
        }
    }
    out
}

/// Drop rows whose `column` names an aggregate (region, income group...).
///
/// Tables without `column` are returned unchanged.
pub fn drop_aggregate_rows(table: &RawTable, column: &str, denylist: &EntityDenylist) -> RawTable {
    let Some(idx) = table.column_index(column) else {
        return table.clone();
    };
    let mut out = RawTable::new(table.columns().to_vec());
    for row in table.rows() {
        let keep = match row[idx].as_text() {
            Some(name) => !denylist.is_aggregate(&name),
            None => true,
        };
        if keep {
            out.push_row(row.clone());
        }
    }
    out
}
