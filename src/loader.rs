use crate::config::{ColumnNames, Settings};
use crate::error::{ReportError, Result};
use crate::schema::{normalize_table, validate_schema};
use crate::types::{AssetRecord, Cell, CoercedRecord, NormalizedTable, RawTable};
use crate::util::{parse_f64_safe, parse_year};
use csv::ReaderBuilder;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub dropped_columns: Vec<String>,
    pub missing_year_rows: usize,
    pub kept_rows: usize,
}

/// Read the first table of a CSV file or workbook, without interpreting it.
pub fn read_table(path: &Path) -> Result<(RawTable, usize)> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => read_csv(path),
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path).map(|t| (t, 0)),
        other => Err(ReportError::UnsupportedInput(format!(
            "{} (extension '{}')",
            path.display(),
            other
        ))),
    }
}

fn read_csv(path: &Path) -> Result<(RawTable, usize)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReportError::EmptyInput);
    }
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut parse_errors = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "skipping unreadable CSV row");
                parse_errors += 1;
                continue;
            }
        };
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok((RawTable { headers, rows }, parse_errors))
}

#[cfg(feature = "xlsx")]
fn cell_from(d: &calamine::Data) -> Cell {
    use crate::util::excel_serial_to_date;
    use calamine::Data;
    match d {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => Cell::text(s),
        _ => Cell::Empty,
    }
}

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path) -> Result<RawTable> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReportError::EmptyInput)??;
    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(row) => row.iter().map(|d| d.to_string()).collect(),
        None => return Err(ReportError::EmptyInput),
    };
    let rows: Vec<Vec<Cell>> = rows_iter
        .map(|row| row.iter().map(cell_from).collect())
        .collect();
    Ok(RawTable { headers, rows })
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(path: &Path) -> Result<RawTable> {
    Err(ReportError::UnsupportedInput(format!(
        "{} (built without workbook support)",
        path.display()
    )))
}

/// Convert the fields of interest; anything unparsable becomes `None`.
pub fn coerce_records(table: &NormalizedTable, names: &ColumnNames) -> Vec<CoercedRecord> {
    let idx = |name: &str| table.column_index(name);
    let (id_i, label_i, year_i) = (idx(&names.asset_id), idx(&names.label), idx(&names.year));
    let (acq_i, amo_i, book_i) = (
        idx(&names.acquisition),
        idx(&names.amortization),
        idx(&names.book_value),
    );
    let qty_i = idx(&names.quantity);

    let empty = Cell::Empty;
    table
        .rows
        .iter()
        .map(|row| {
            let get = |i: Option<usize>| i.and_then(|i| row.get(i)).unwrap_or(&empty);
            CoercedRecord {
                asset_id: get(id_i).as_text(),
                label: get(label_i).as_text(),
                year: parse_year(get(year_i)),
                acquisition: parse_f64_safe(get(acq_i)),
                amortization: parse_f64_safe(get(amo_i)),
                book_value: parse_f64_safe(get(book_i)),
                quantity: parse_f64_safe(get(qty_i)),
            }
        })
        .collect()
}

/// Keep only records with a usable year. Returns the survivors and how many
/// were dropped.
pub fn drop_undated(records: Vec<CoercedRecord>) -> (Vec<AssetRecord>, usize) {
    let before = records.len();
    let kept: Vec<AssetRecord> = records
        .into_iter()
        .filter_map(|r| {
            let year = r.year?;
            Some(AssetRecord {
                asset_id: r.asset_id,
                label: r.label,
                year,
                acquisition: r.acquisition,
                amortization: r.amortization,
                book_value: r.book_value,
                quantity: r.quantity,
            })
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Normalize, validate and coerce an already-read table.
pub fn clean_table(raw: RawTable, settings: &Settings) -> Result<(Vec<AssetRecord>, LoadReport)> {
    let total_rows = raw.rows.len();
    let (table, dropped_columns) = normalize_table(raw);
    if !dropped_columns.is_empty() {
        debug!(columns = ?dropped_columns, "dropped stray year-like columns");
    }
    validate_schema(&table, &settings.profile.required(&settings.columns))?;

    let (records, missing_year_rows) = drop_undated(coerce_records(&table, &settings.columns));
    if missing_year_rows > 0 {
        warn!(rows = missing_year_rows, "rows without a usable activation year were dropped");
    }
    let report = LoadReport {
        total_rows,
        parse_errors: 0,
        dropped_columns,
        missing_year_rows,
        kept_rows: records.len(),
    };
    Ok((records, report))
}

pub fn load_and_clean(path: &Path, settings: &Settings) -> Result<(Vec<AssetRecord>, LoadReport)> {
    let (raw, parse_errors) = read_table(path)?;
    info!(path = %path.display(), rows = raw.rows.len(), columns = raw.headers.len(), "read input table");
    let (records, mut report) = clean_table(raw, settings)?;
    report.total_rows += parse_errors;
    report.parse_errors = parse_errors;
    Ok((records, report))
}
