use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ItnError>;

/// Failures of the loading and export layer. Extraction and aggregation never
/// fail; they report recovered issues alongside their output instead.
#[derive(Debug, Error)]
pub enum ItnError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook has no usable worksheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the QR payload column is not in the header row.
    #[error("required column '{column}' not found; available columns: {available}")]
    MissingColumn { column: String, available: String },

    /// Raised when the input or output extension is not recognised.
    #[error("unsupported file format for {0}")]
    UnsupportedFormat(PathBuf),

    /// Raised when a hierarchy filter value is unusable.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
