use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::distribution::aggregate::{Summaries, summarize};
use crate::distribution::error::Result;
use crate::distribution::extract::{Extraction, ExtractionIssue, extract_records};
use crate::distribution::filter::{self, LocationFilter};
use crate::distribution::io::{self, excel_write};
use crate::distribution::model::{ColumnScheme, EnrichedRecord, LocationField};
use crate::distribution::tabulate::{build_workbook, records_table};

/// Where and how to read the input table.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// Worksheet to read; the first one when unset.
    pub sheet: Option<String>,
    pub scheme: ColumnScheme,
}

/// Enriched rows together with the summaries computed over them.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<EnrichedRecord>,
    pub extraction_issues: Vec<ExtractionIssue>,
    pub summaries: Summaries,
}

/// Loads the input table and parses every QR payload.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn load_records(input: &Path, options: &InputOptions) -> Result<Extraction> {
    let table = io::load_table(input, options.sheet.as_deref(), &options.scheme)?;
    info!(
        rows = table.records.len(),
        columns = table.columns.len(),
        "loaded input table"
    );
    Ok(extract_records(table.records))
}

/// Writes the enriched rows to `output` as CSV or Excel.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn extract_to_file(input: &Path, output: &Path, options: &InputOptions) -> Result<Extraction> {
    let extraction = load_records(input, options)?;
    let table = records_table(&extraction.records);
    debug!(columns = table.columns.len(), "extracted table constructed");
    io::write_table(output, &table)?;
    Ok(extraction)
}

/// Loads, extracts, narrows to `filter` and summarises the input table.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn analyse(input: &Path, options: &InputOptions, filter: &LocationFilter) -> Result<Analysis> {
    let extraction = load_records(input, options)?;
    let total = extraction.records.len();
    let records = filter.apply_owned(extraction.records);
    if !filter.is_empty() {
        info!(kept = records.len(), total, "applied location filter");
    }
    let summaries = summarize(&records);
    Ok(Analysis {
        records,
        extraction_issues: extraction.issues,
        summaries,
    })
}

/// Lists the values selectable at `level`, given the selections already made
/// for the levels above it.
#[instrument(level = "info", skip_all, fields(input = %input.display(), %level))]
pub fn level_options(
    input: &Path,
    options: &InputOptions,
    level: LocationField,
    filter: &LocationFilter,
) -> Result<Vec<String>> {
    let extraction = load_records(input, options)?;
    let values = filter::options(&extraction.records, level, filter);
    debug!(values = values.len(), "collected level options");
    Ok(values)
}

/// Persists the enriched rows and every summary view into one workbook.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn write_report_workbook(output: &Path, analysis: &Analysis) -> Result<()> {
    let workbook = build_workbook(&analysis.records, &analysis.summaries);
    debug!(sheet_count = workbook.tables.len(), "workbook constructed");
    excel_write::write_workbook(output, &workbook)
}

/// Persists the summaries as pretty-printed JSON.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn write_summary_json(output: &Path, summaries: &Summaries) -> Result<()> {
    let json_string = serde_json::to_string_pretty(summaries)?;
    fs::write(output, json_string)?;
    Ok(())
}
