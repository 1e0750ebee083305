use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unrecognized description labels: {}", .0.join(", "))]
    UnrecognizedLabels(Vec<String>),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Input has no header row")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, ReportError>;
