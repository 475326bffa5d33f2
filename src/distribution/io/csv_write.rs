use std::path::Path;

use crate::distribution::error::Result;
use crate::distribution::tabulate::SheetTable;

/// Writes a single table as CSV with a header row.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
