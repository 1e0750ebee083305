// Column normalization and required-column validation.
use crate::config::ColumnNames;
use crate::error::{ReportError, Result};
use crate::types::{Cell, NormalizedTable, RawTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Which columns a deployment insists on before any processing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaProfile {
    /// Identifier, label, year and the three monetary fields.
    #[default]
    Minimal,
    /// `Minimal` plus quantity.
    WithQuantity,
    /// Every column of the full asset register export.
    Full,
}

/// Columns of the full register export besides the ones `ColumnNames` covers.
const FULL_EXPORT_EXTRA: &[&str] = &[
    "Subnúmero",
    "Capitalizado el",
    "Denominación del activo fijo",
    "Número de serie",
    "Denominación del activo fijo_5",
    "Amortización normal",
    "Moneda",
    "Unidad de Retiro",
];

impl SchemaProfile {
    pub fn required(self, names: &ColumnNames) -> Vec<String> {
        let mut req = vec![
            names.asset_id.clone(),
            names.label.clone(),
            names.year.clone(),
            names.acquisition.clone(),
            names.amortization.clone(),
            names.book_value.clone(),
        ];
        match self {
            SchemaProfile::Minimal => {}
            SchemaProfile::WithQuantity => req.push(names.quantity.clone()),
            SchemaProfile::Full => {
                req.push(names.quantity.clone());
                req.extend(FULL_EXPORT_EXTRA.iter().map(|s| s.to_string()));
            }
        }
        req
    }
}

/// Canonical header names, one per input position.
///
/// Headers are trimmed. The first occurrence of a name keeps it; a repeat
/// becomes `name_<position>`, with the suffix re-applied until the result
/// collides with nothing else in the header row.
pub fn normalize_columns(headers: &[String]) -> Vec<String> {
    let trimmed: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let verbatim: HashSet<&str> = trimmed.iter().map(|s| s.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(trimmed.len());
    for (idx, name) in trimmed.iter().enumerate() {
        let mut candidate = name.clone();
        if seen.contains(&candidate) {
            candidate = format!("{}_{}", candidate, idx);
            while seen.contains(&candidate) || verbatim.contains(candidate.as_str()) {
                candidate = format!("{}_{}", candidate, idx);
            }
            debug!(from = %name, to = %candidate, "renamed duplicate column");
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// A header made of exactly four digits, e.g. a stray `2025` column.
fn is_year_like(name: &str) -> bool {
    name.len() == 4 && name.chars().all(|c| c.is_ascii_digit())
}

/// Rename duplicates, drop stray year-like columns and pad short rows.
///
/// Returns the table plus the names of the columns that were dropped.
pub fn normalize_table(raw: RawTable) -> (NormalizedTable, Vec<String>) {
    let canonical = normalize_columns(&raw.headers);
    let keep: Vec<usize> = canonical
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_year_like(name))
        .map(|(i, _)| i)
        .collect();
    let dropped: Vec<String> = canonical
        .iter()
        .filter(|name| is_year_like(name))
        .cloned()
        .collect();
    let columns: Vec<String> = keep.iter().map(|&i| canonical[i].clone()).collect();
    let rows = raw
        .rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&i| row.get(i).cloned().unwrap_or(Cell::Empty))
                .collect()
        })
        .collect();
    (NormalizedTable { columns, rows }, dropped)
}

/// Fails with every required column the table lacks, in declared order.
pub fn validate_schema(table: &NormalizedTable, required: &[String]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !table.has_column(name))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumns(missing))
    }
}
