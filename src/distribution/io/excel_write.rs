use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook, Worksheet};

use crate::distribution::error::Result;
use crate::distribution::tabulate::{SheetTable, TableCell, WorkbookData};

/// Writes the provided workbook data to the given path, one worksheet per
/// table with an autofilter table over the data.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;
        write_sheet(worksheet, table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, table: &SheetTable) -> Result<()> {
    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            match cell {
                TableCell::Text(value) => {
                    worksheet.write_string(excel_row, col_idx as u16, value)?;
                }
                TableCell::Number(value) => {
                    worksheet.write_number(excel_row, col_idx as u16, *value)?;
                }
                TableCell::Blank => {}
            }
        }
    }

    // Excel tables need at least one data row and unique headers.
    if table.rows.is_empty() || table.columns.is_empty() || has_duplicate_headers(&table.columns) {
        return Ok(());
    }

    let columns: Vec<TableColumn> = table
        .columns
        .iter()
        .map(|header| TableColumn::new().set_header(header))
        .collect();
    let mut excel_table = Table::new();
    excel_table.set_autofilter(true).set_columns(&columns);

    let col_end = (table.columns.len() as u16).saturating_sub(1);
    let row_end = table.rows.len() as u32;
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
    Ok(())
}

fn has_duplicate_headers(columns: &[String]) -> bool {
    let mut seen = HashSet::new();
    !columns.iter().all(|header| seen.insert(header.to_lowercase()))
}
