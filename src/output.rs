use crate::error::Result;
use crate::types::FormattedRow;
use serde::Serialize;
use std::path::Path;
use tabled::settings::{format::Format, object::Rows, Modify, Style};
use tabled::{Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote CSV");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!(path = %path.display(), "wrote JSON");
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Markdown table of a formatted summary with the TOTAL row in bold.
pub fn render_summary(rows: &[FormattedRow]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::markdown());
    if rows.last().map_or(false, |r| r.is_total) {
        table.with(Modify::new(Rows::last()).with(Format::content(|s| format!("**{}**", s))));
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ComparisonPoint};

    fn row(year: &str, total: bool) -> FormattedRow {
        FormattedRow {
            year: year.to_string(),
            count: "2".to_string(),
            acquisition: "1,500.00".to_string(),
            amortization: "0.00".to_string(),
            book_value: "1,500.00".to_string(),
            is_total: total,
        }
    }

    #[test]
    fn csv_has_display_columns_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &[row("2020", false), row("TOTAL", true)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Year,Count,Acquisition,Amortization,BookValue"));
        assert_eq!(lines.next(), Some("2020,2,\"1,500.00\",0.00,\"1,500.00\""));
        assert_eq!(lines.next(), Some("TOTAL,2,\"1,500.00\",0.00,\"1,500.00\""));
    }

    #[test]
    fn comparison_csv_uses_category_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmp.csv");
        let points = vec![ComparisonPoint {
            category: Category::LowIntensity,
            year: 2020,
            value: 5.5,
        }];
        write_csv(&path, &points).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Category,Year,Value\n"));
        assert!(text.contains("Low-Intensity LED,2020,5.5"));
    }

    #[test]
    fn total_row_is_highlighted() {
        let out = render_summary(&[row("2020", false), row("TOTAL", true)]);
        assert!(out.contains("**TOTAL**"));
        assert!(!out.contains("**2020**"));
    }

    #[test]
    fn json_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }
}
