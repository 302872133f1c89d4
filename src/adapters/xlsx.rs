//! Minimal single-sheet XLSX support.
//!
//! Writing goes through `rust_xlsxwriter`; reading goes through `calamine`,
//! which also handles legacy `.xls`.

use crate::utils::error::{Result, TrackerError};
use calamine::{Data, Reader};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use std::path::Path;

/// A header row plus data rows, all cells as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Values of one column; short rows yield an empty string.
    pub fn column(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect()
    }
}

/// Builds an XLSX workbook with one sheet named `Sheet1`. Empty cells are left blank.
pub fn write_xlsx<R: AsRef<str>>(headers: &[&str], rows: &[Vec<R>]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_row: Vec<&str> = headers.to_vec();
    let all_rows = std::iter::once(header_row).chain(
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.as_ref()).collect()),
    );

    for (row_idx, row) in all_rows.enumerate() {
        let row_num = u32::try_from(row_idx)
            .map_err(|_| TrackerError::spreadsheet("too many rows for one sheet"))?;
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let col_num = u16::try_from(col_idx)
                .map_err(|_| TrackerError::spreadsheet("too many columns for one sheet"))?;
            worksheet.write_string(row_num, col_num, *cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn first_sheet<RS>(mut workbook: calamine::Sheets<RS>) -> Result<SheetTable>
where
    RS: std::io::Read + std::io::Seek,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TrackerError::spreadsheet("workbook has no sheets"))?
        .map_err(|e| TrackerError::spreadsheet(format!("failed to read sheet: {}", e)))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    let headers = rows.next().unwrap_or_default();
    Ok(SheetTable {
        headers,
        rows: rows.collect(),
    })
}

pub fn read_xlsx_bytes(bytes: Vec<u8>) -> Result<SheetTable> {
    let workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| TrackerError::spreadsheet(format!("failed to open workbook: {}", e)))?;
    first_sheet(workbook)
}

pub fn read_xlsx_file<P: AsRef<Path>>(path: P) -> Result<SheetTable> {
    let workbook = calamine::open_workbook_auto(path.as_ref())
        .map_err(|e| TrackerError::spreadsheet(format!("failed to open workbook: {}", e)))?;
    first_sheet(workbook)
}
