//! Column resolution: map semantic roles onto raw column names.
//!
//! Sources disagree on header spelling (`Year`, ` year `, `Country Name`,
//! `co2_emissions_mt`...). Each dataset declares, per role, an ordered list of
//! lowercase substrings; the resolver picks the first raw column matching the
//! highest-priority candidate.
//!
//! Rules:
//! - candidate order is priority order (`"co2"` before a generic `"value"`).
//!   The scan is candidate-first, not column-first: with candidates
//!   `["co2", "emission"]` over `[year, emissions_total, co2_per_capita]` the
//!   value role binds `co2_per_capita`, although `emissions_total` comes first
//!   in the file. Put the preferred column's fragment first in the list.
//! - among columns matching the same candidate, the leftmost wins
//! - a raw column is bound to at most one role (roles resolve in declaration order)
//! - a required role without a match is an error, never a silent substitute

use serde::{Deserialize, Serialize};

use crate::domain::{RawTable, Role};
use crate::error::TrendError;

/// Candidate substrings for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCandidates {
    pub role: Role,
    pub candidates: Vec<String>,
    pub required: bool,
}

/// Declarative `role -> ordered candidates` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub roles: Vec<RoleCandidates>,
}

impl RoleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, role: Role, candidates: &[&str]) -> Self {
        self.with(role, candidates, true)
    }

    pub fn optional(self, role: Role, candidates: &[&str]) -> Self {
        self.with(role, candidates, false)
    }

    fn with(mut self, role: Role, candidates: &[&str], required: bool) -> Self {
        self.roles.push(RoleCandidates {
            role,
            candidates: candidates.iter().map(|c| c.trim().to_lowercase()).collect(),
            required,
        });
        self
    }
}

/// Resolved `role -> raw column name` mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    entries: Vec<(Role, String)>,
}

impl ColumnMap {
    pub fn get(&self, role: Role) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, c)| c.as_str())
    }

    pub fn insert(&mut self, role: Role, column: impl Into<String>) {
        let column = column.into();
        match self.entries.iter_mut().find(|(r, _)| *r == role) {
            Some(entry) => entry.1 = column,
            None => self.entries.push((role, column)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.entries.iter().map(|(r, c)| (*r, c.as_str()))
    }
}

/// Resolve every role in `spec` against the table's columns.
pub fn resolve(table: &RawTable, spec: &RoleSpec) -> Result<ColumnMap, TrendError> {
    resolve_columns(table.columns(), spec)
}

/// Same as [`resolve`], over a bare header list.
pub fn resolve_columns(columns: &[String], spec: &RoleSpec) -> Result<ColumnMap, TrendError> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header_name(c)).collect();
    let mut taken = vec![false; columns.len()];
    let mut map = ColumnMap::default();

    for role in &spec.roles {
        let found = role.candidates.iter().find_map(|cand| {
            normalized
                .iter()
                .enumerate()
                .find(|(idx, name)| !taken[*idx] && name.contains(cand.as_str()))
                .map(|(idx, _)| idx)
        });

        match found {
            Some(idx) => {
                taken[idx] = true;
                map.insert(role.role, columns[idx].clone());
            }
            None if role.required => {
                return Err(TrendError::ColumnResolution {
                    role: role.role,
                    available_columns: columns.to_vec(),
                });
            }
            None => {}
        }
    }

    Ok(map)
}

/// Lowercase, trimmed, BOM-free header used for matching.
pub fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_lowercase()
}
