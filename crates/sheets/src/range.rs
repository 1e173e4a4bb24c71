//! A1-notation ranges for the source and result columns.

use pipeline::{ColumnIndex, SheetName};

/// First data row; row 1 holds headers.
pub const FIRST_DATA_ROW: usize = 2;

/// Quotes a sheet name for A1 notation when it is not a plain identifier.
pub fn quote_sheet(sheet: &SheetName) -> String {
    let name = sheet.as_str();
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_owned()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Source texts: column `A` from the first data row to the end of the sheet.
pub fn read_range(sheet: &SheetName) -> String {
    format!("{}!A{FIRST_DATA_ROW}:A", quote_sheet(sheet))
}

/// Result cells for `len` values starting `start_offset` rows below the
/// first data row.
pub fn write_range(sheet: &SheetName, column: ColumnIndex, start_offset: usize, len: usize) -> String {
    let letter = column.letter();
    let first = start_offset + FIRST_DATA_ROW;
    let last = first + len.saturating_sub(1);
    format!("{}!{letter}{first}:{letter}{last}", quote_sheet(sheet))
}
