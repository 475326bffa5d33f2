//! Parsing of scanned QR payloads into location fields.
//!
//! Each payload is a loosely formatted block of `Label: value` lines. Labels
//! may appear anywhere in the text, in any order, and may be missing. Every
//! input row yields exactly one [`EnrichedRecord`]; problems are reported as
//! [`ExtractionIssue`] values next to the output instead of aborting.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::distribution::model::{
    CellValue, EnrichedRecord, ExtractedLocation, LocationField, RawRecord,
};

/// A location field paired with its compiled label pattern, or the reason
/// the pattern is unavailable.
type LabelPattern = (LocationField, Result<Regex, regex::Error>);

/// Compiled label patterns, one per location field.
static LABEL_PATTERNS: Lazy<Vec<LabelPattern>> = Lazy::new(|| {
    LocationField::ALL
        .iter()
        .map(|field| (*field, label_pattern(field.label())))
        .collect()
});

fn label_pattern(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{}:([^\n]*)", regex::escape(label)))
}

/// A condition recovered while parsing a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionIssue {
    /// One field could not be extracted; only that field is absent.
    Field {
        row: usize,
        field: LocationField,
        reason: String,
    },
    /// The whole payload could not be processed; all fields are absent.
    Row { row: usize, reason: String },
}

impl fmt::Display for ExtractionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionIssue::Field { row, field, reason } => {
                write!(f, "row {row}: could not extract {field}: {reason}")
            }
            ExtractionIssue::Row { row, reason } => {
                write!(f, "row {row}: could not read QR payload: {reason}")
            }
        }
    }
}

/// Output of [`extract_records`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub records: Vec<EnrichedRecord>,
    pub issues: Vec<ExtractionIssue>,
}

/// Parses every row's payload and attaches the resulting location.
///
/// The output has the same length and order as `records`.
#[instrument(level = "debug", skip_all, fields(rows = records.len()))]
pub fn extract_records(records: Vec<RawRecord>) -> Extraction {
    let mut extraction = Extraction {
        records: Vec::with_capacity(records.len()),
        issues: Vec::new(),
    };

    for (row, record) in records.into_iter().enumerate() {
        let location = match record.scan_text.as_ref() {
            Some(cell) => extract_cell(row, cell, &mut extraction.issues),
            None => ExtractedLocation::default(),
        };
        extraction.records.push(EnrichedRecord {
            location,
            cells: record.cells,
        });
    }

    for issue in &extraction.issues {
        warn!(%issue, "recovered QR payload issue");
    }
    debug!(
        rows = extraction.records.len(),
        issues = extraction.issues.len(),
        "extracted locations"
    );
    extraction
}

fn extract_cell(row: usize, cell: &CellValue, issues: &mut Vec<ExtractionIssue>) -> ExtractedLocation {
    match cell {
        CellValue::Text(text) => extract_text(row, text, issues),
        CellValue::Number(_) | CellValue::Boolean(_) => {
            extract_text(row, &cell.to_string(), issues)
        }
        CellValue::Empty => ExtractedLocation::default(),
        CellValue::Error(code) => {
            issues.push(ExtractionIssue::Row {
                row,
                reason: format!("cell holds spreadsheet error {code}"),
            });
            ExtractedLocation::default()
        }
    }
}

fn extract_text(row: usize, text: &str, issues: &mut Vec<ExtractionIssue>) -> ExtractedLocation {
    extract_with(&LABEL_PATTERNS, row, text, issues)
}

/// Applies each pattern independently. A pattern that is unavailable leaves
/// its field absent and records an issue; the remaining fields are still read.
fn extract_with(
    patterns: &[LabelPattern],
    row: usize,
    text: &str,
    issues: &mut Vec<ExtractionIssue>,
) -> ExtractedLocation {
    let mut location = ExtractedLocation::default();
    for (field, pattern) in patterns {
        match pattern {
            Ok(regex) => location.set(*field, capture_value(regex, text)),
            Err(error) => issues.push(ExtractionIssue::Field {
                row,
                field: *field,
                reason: error.to_string(),
            }),
        }
    }
    location
}

fn capture_value(regex: &Regex, text: &str) -> Option<String> {
    let captured = regex.captures(text)?.get(1)?.as_str().trim();
    if captured.is_empty() {
        None
    } else {
        Some(captured.to_string())
    }
}

/// Parses a single payload. Rows are not numbered and issues are dropped.
pub fn extract_location(text: &str) -> ExtractedLocation {
    extract_text(0, text, &mut Vec::new())
}
