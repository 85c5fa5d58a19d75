#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::error::{LangError, LangResult};
use crate::types::{Sheet, Table, Workbook};

/// Read a spreadsheet document (`.xlsx`, `.xls`, `.ods`, etc.) into a [`Workbook`].
///
/// Behavior:
/// - If `sheet_names` is `None`, reads **all sheets** in workbook order; otherwise only the
///   listed sheets, in the given order
/// - Cells are converted to strings; integral numbers print without a fractional part
/// - Rows/columns before the used range are kept as empty cells, so `A1` is always `(0, 0)`
/// - Trailing empty cells of each row are dropped
pub fn read_excel_from_path(
    path: impl AsRef<Path>,
    sheet_names: Option<&[&str]>,
) -> LangResult<Workbook> {
    let mut workbook = open_workbook_auto(path)?;

    let names: Vec<String> = match sheet_names {
        Some(names) => names.iter().map(|s| s.to_string()).collect(),
        None => workbook.sheet_names().to_vec(),
    };
    if names.is_empty() {
        return Err(LangError::malformed("workbook has no sheets"));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        sheets.push(Sheet::new(name, range_to_table(&range)));
    }
    Ok(Workbook::new(sheets))
}

fn range_to_table(range: &calamine::Range<Data>) -> Table {
    let (row_offset, col_offset) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Table::default(),
    };

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells: Vec<String> = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_to_string));
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }
    Table::new(rows)
}

fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}
