use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// A single spreadsheet cell as it came out of the reader, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    /// String view used for identifier and label fields.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
            Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Header row plus data rows exactly as read, duplicates and all.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Table whose column names are unique. Every row has one cell per column.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl NormalizedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}

/// Row after numeric coercion; any field that failed to parse is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRecord {
    pub asset_id: Option<String>,
    pub label: Option<String>,
    pub year: Option<i32>,
    pub acquisition: Option<f64>,
    pub amortization: Option<f64>,
    pub book_value: Option<f64>,
    pub quantity: Option<f64>,
}

/// Row that survived the year filter and can be grouped.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub asset_id: Option<String>,
    pub label: Option<String>,
    pub year: i32,
    pub acquisition: Option<f64>,
    pub amortization: Option<f64>,
    pub book_value: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "High-Intensity LED", alias = "high-intensity")]
    HighIntensity,
    #[serde(rename = "Low-Intensity LED", alias = "low-intensity")]
    LowIntensity,
    #[serde(rename = "Uncategorized", alias = "uncategorized")]
    Uncategorized,
    #[serde(rename = "Unrecognized", alias = "unrecognized")]
    Unrecognized,
}

impl Category {
    /// Presentation order.
    pub const ALL: [Category; 4] = [
        Category::HighIntensity,
        Category::LowIntensity,
        Category::Uncategorized,
        Category::Unrecognized,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::HighIntensity => "High-Intensity LED",
            Category::LowIntensity => "Low-Intensity LED",
            Category::Uncategorized => "Uncategorized",
            Category::Unrecognized => "Unrecognized",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::HighIntensity => "high_intensity",
            Category::LowIntensity => "low_intensity",
            Category::Uncategorized => "uncategorized",
            Category::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKey {
    Year(i32),
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationRow {
    pub key: RowKey,
    pub count: usize,
    pub sum_acquisition: f64,
    pub sum_amortization: f64,
    pub sum_book_value: f64,
    pub sum_quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    /// Year rows ascending, TOTAL last.
    pub rows: Vec<AggregationRow>,
}

impl CategorySummary {
    pub fn year_rows(&self) -> impl Iterator<Item = &AggregationRow> {
        self.rows.iter().filter(|r| matches!(r.key, RowKey::Year(_)))
    }

    pub fn total(&self) -> Option<&AggregationRow> {
        self.rows.last().filter(|r| r.key == RowKey::Total)
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct FormattedRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: String,
    #[serde(rename = "Acquisition")]
    #[tabled(rename = "Acquisition")]
    pub acquisition: String,
    #[serde(rename = "Amortization")]
    #[tabled(rename = "Amortization")]
    pub amortization: String,
    #[serde(rename = "BookValue")]
    #[tabled(rename = "BookValue")]
    pub book_value: String,
    #[serde(skip)]
    #[tabled(skip)]
    pub is_total: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Count,
    Acquisition,
    Amortization,
    BookValue,
    Quantity,
}

impl Metric {
    pub fn of(self, row: &AggregationRow) -> f64 {
        match self {
            Metric::Count => row.count as f64,
            Metric::Acquisition => row.sum_acquisition,
            Metric::Amortization => row.sum_amortization,
            Metric::BookValue => row.sum_book_value,
            Metric::Quantity => row.sum_quantity,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::Acquisition => "acquisition",
            Metric::Amortization => "amortization",
            Metric::BookValue => "book_value",
            Metric::Quantity => "quantity",
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ComparisonPoint {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats<'a> {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub missing_year_rows: usize,
    pub unrecognized_labels: &'a [LabelCount],
    pub summaries: &'a [CategorySummary],
}
