//! Excel/ODS file reader using calamine

use crate::error::{Error, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::path::Path;

pub mod table;

pub use table::{CellValue, Table};

/// Date-formatted cells are rendered as text in this layout
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read one worksheet from a file path. Without a sheet name the first sheet is used.
pub fn read_table<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    let mut excel: Sheets<_> = open_workbook_auto(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet_names = excel.sheet_names();
    let name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(Error::SheetNotFound {
                    name: name.to_string(),
                    available: sheet_names,
                });
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| Error::NoSheets(path.to_path_buf()))?,
    };

    let range = excel
        .worksheet_range(&name)
        .map_err(|source| Error::ReadSheet {
            sheet: name.clone(),
            source,
        })?;

    let table = parse_range(&name, &range);
    tracing::debug!(
        sheet = %name,
        rows = table.len(),
        columns = table.width(),
        "read worksheet"
    );
    Ok(table)
}

/// Materialise a calamine range from A1 down to its last used cell
fn parse_range(name: &str, range: &Range<Data>) -> Table {
    let Some((max_row, max_col)) = range.end() else {
        return Table::new(name, Vec::new());
    };

    let rows = (0..=max_row)
        .map(|row| {
            (0..=max_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map_or(CellValue::Empty, parse_cell_value)
                })
                .collect()
        })
        .collect();

    Table::new(name, rows)
}

fn parse_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
        Data::DateTime(dt) if dt.is_datetime() => dt
            .as_datetime()
            .map_or(CellValue::Number(dt.as_f64()), |value| {
                CellValue::Text(value.format(DATETIME_FORMAT).to_string())
            }),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
