use std::path::Path;

use csv::ReaderBuilder;

use crate::distribution::error::Result;
use crate::distribution::io::table_from_rows;
use crate::distribution::model::{CellValue, ColumnScheme, RawTable};

/// Reads the distribution table from a CSV export. Short rows are padded with
/// blank cells and blank fields load as [`CellValue::Empty`].
pub fn read_table(path: &Path, scheme: &ColumnScheme) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::from_text).collect::<Vec<_>>());
    }
    table_from_rows(rows.into_iter(), scheme)
}
