//! Errors surfaced by extraction. Row-level parse failures are not errors;
//! those rows are dropped during cleaning.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: '{file_name}' (expected .csv or .pdf)")]
    UnsupportedFileType { file_name: String },

    #[error("missing column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("no table in the PDF has both '{date_col}' and '{closing_col}' columns")]
    NoMatchingTable { date_col: String, closing_col: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
