use crate::domain::model::SheetTable;
use crate::utils::error::{RedirectError, Result};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// A cell destined for an exported workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Number(value as f64)
    }
}

/// Reads every sheet of a workbook (xlsx, xls or ods) in workbook order.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<SheetTable>> {
    let mut workbook = open_workbook_auto(path)?;
    read_all_sheets(&mut workbook)
}

pub fn read_workbook_bytes(data: Vec<u8>) -> Result<Vec<SheetTable>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    read_all_sheets(&mut workbook)
}

/// Reads one sheet by name, or the first sheet when `sheet` is `None`.
pub fn read_sheet<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)?;

    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| RedirectError::ProcessingError {
                message: "Workbook contains no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&name)?;
    Ok(range_to_table(&name, &range))
}

fn read_all_sheets<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Vec<SheetTable>> {
    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        tables.push(range_to_table(&name, &range));
    }
    Ok(tables)
}

/// First row is the header; fully blank rows are dropped.
fn range_to_table(name: &str, range: &Range<Data>) -> SheetTable {
    let mut rows = range.rows();

    let headers = rows
        .next()
        .map(|row| row.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    SheetTable {
        name: name.to_string(),
        headers,
        rows,
    }
}

/// Handles are often typed as numbers in Excel; integral floats lose the `.0`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Serialises a single-sheet workbook with a header row.
pub fn write_table_xlsx(
    sheet_name: &str,
    headers: &[String],
    rows: &[Vec<CellValue>],
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header.as_str())?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                CellValue::Text(text) => {
                    worksheet.write_string(row_num, col as u16, text.as_str())?;
                }
                CellValue::Number(number) => {
                    worksheet.write_number(row_num, col as u16, *number)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
