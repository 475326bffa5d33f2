use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::distribution::error::{ItnError, Result};
use crate::distribution::io::table_from_rows;
use crate::distribution::model::{CellValue, ColumnScheme, RawTable};

/// Reads the distribution table from a workbook. Without an explicit `sheet`
/// the first worksheet is used.
pub fn read_table(path: &Path, sheet: Option<&str>, scheme: &ColumnScheme) -> Result<RawTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = distribution_sheet(&mut workbook, sheet)?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>());
    table_from_rows(rows, scheme)
}

/// Resolves the worksheet holding the distribution rows, naming the sheets
/// that do exist when the requested one is missing.
fn distribution_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    sheet: Option<&str>,
) -> Result<Range<DataType>> {
    let sheet_names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(name) => name.to_string(),
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ItnError::InvalidWorkbook("workbook has no worksheets".into()))?,
    };

    match workbook.worksheet_range(&name) {
        Some(range) => Ok(range?),
        None => Err(ItnError::InvalidWorkbook(format!(
            "worksheet '{name}' not found; available worksheets: {}",
            sheet_names.join(", ")
        ))),
    }
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::from_text(value),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::Error(error) => CellValue::Error(error.to_string()),
        DataType::Empty => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}
