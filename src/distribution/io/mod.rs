//! Loading input tables and writing reports. Everything in here sits outside
//! the extraction and aggregation core and is free to fail.

pub mod csv_read;
pub mod csv_write;
pub mod excel_read;
pub mod excel_write;

use std::path::Path;

use crate::distribution::error::{ItnError, Result};
use crate::distribution::model::{CellValue, ColumnScheme, RawRecord, RawTable};
use crate::distribution::tabulate::{SheetTable, WorkbookData};

/// File formats understood by the loader and the table writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Excel,
    Csv,
}

/// Infers the table format from the file extension.
pub fn detect_format(path: &Path) -> Result<TableFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(TableFormat::Excel),
        Some("csv") => Ok(TableFormat::Csv),
        _ => Err(ItnError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Loads the input table from an Excel workbook or a CSV file.
///
/// `sheet` selects a worksheet by name and is ignored for CSV input.
pub fn load_table(path: &Path, sheet: Option<&str>, scheme: &ColumnScheme) -> Result<RawTable> {
    if !path.exists() {
        return Err(ItnError::MissingInput(path.to_path_buf()));
    }
    match detect_format(path)? {
        TableFormat::Excel => excel_read::read_table(path, sheet, scheme),
        TableFormat::Csv => csv_read::read_table(path, scheme),
    }
}

/// Writes a single table, choosing the format from the file extension.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<()> {
    match detect_format(path)? {
        TableFormat::Excel => excel_write::write_workbook(
            path,
            &WorkbookData {
                tables: vec![table.clone()],
            },
        ),
        TableFormat::Csv => csv_write::write_table(path, table),
    }
}

/// Splits header and data rows into a [`RawTable`], pulling the payload
/// column out of every row. Rows with no content at all are skipped.
pub(crate) fn table_from_rows<I>(mut rows: I, scheme: &ColumnScheme) -> Result<RawTable>
where
    I: Iterator<Item = Vec<CellValue>>,
{
    let headers: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            CellValue::Empty => format!("Column {}", idx + 1),
            other => other.to_string(),
        })
        .collect();

    let scan_idx = headers
        .iter()
        .position(|header| *header == scheme.scan_column)
        .ok_or_else(|| ItnError::MissingColumn {
            column: scheme.scan_column.clone(),
            available: headers.join(", "),
        })?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != scan_idx)
        .map(|(_, header)| header.clone())
        .collect();

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(CellValue::is_empty) {
            continue;
        }
        let scan_text = row.get(scan_idx).filter(|cell| !cell.is_empty()).cloned();
        let cells = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != scan_idx)
            .map(|(idx, header)| {
                let value = row.get(idx).cloned().unwrap_or(CellValue::Empty);
                (header.clone(), value)
            })
            .collect();
        records.push(RawRecord::new(scan_text, cells));
    }

    Ok(RawTable { columns, records })
}
